use std::sync::Arc;

use diesel::prelude::*;
use tempfile::NamedTempFile;

use crate::config::DatabaseConfig;
use crate::db::DatabaseManager;
use crate::db::schema::countries;
use crate::db::sqlite::establish_connection;

/// A schema-initialized sqlite database living in a temp file for the
/// duration of a test.
pub(crate) struct TestDatabase {
    pub(crate) manager: Arc<DatabaseManager>,
    path: String,
    _file: NamedTempFile,
}

impl TestDatabase {
    pub(crate) async fn new() -> Self {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let path = file.path().to_string_lossy().to_string();

        let config = DatabaseConfig {
            filename: Some(path.clone()),
            ..DatabaseConfig::default()
        };

        let manager = DatabaseManager::new(&config).await.expect("db manager");
        manager.ensure_schema().await.expect("ensure schema");

        Self {
            manager: Arc::new(manager),
            path,
            _file: file,
        }
    }

    pub(crate) fn seed_countries(&self, rows: &[(&str, &str)]) {
        let mut conn = establish_connection(&self.path).expect("sqlite connection");
        let values: Vec<_> = rows
            .iter()
            .map(|(code, name)| {
                (
                    countries::country_code.eq(*code),
                    countries::country_name.eq(*name),
                )
            })
            .collect();

        diesel::insert_into(countries::table)
            .values(&values)
            .execute(&mut conn)
            .expect("seed countries");
    }
}
