use crate::config::{DatabaseConfig as ConfigDatabaseConfig, DbType as ConfigDbType};
use crate::db::{CountryStore, DatabaseError, UserStore, VisitStore};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::{debug, info};

#[cfg(feature = "postgres")]
use crate::db::postgres::{PostgresCountryStore, PostgresUserStore, PostgresVisitStore};
#[cfg(feature = "postgres")]
use diesel::RunQueryDsl;
#[cfg(feature = "postgres")]
use diesel::pg::PgConnection;
#[cfg(feature = "postgres")]
use diesel::r2d2::{self, ConnectionManager};

#[cfg(feature = "postgres")]
pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;

#[cfg(feature = "sqlite")]
use crate::db::sqlite::{
    SqliteCountryStore, SqliteUserStore, SqliteVisitStore, establish_connection,
};

const POSTGRES_SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        color TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS countries (
        id SERIAL PRIMARY KEY,
        country_code TEXT NOT NULL,
        country_name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS visited_countries (
        id SERIAL PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id),
        country_code TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_visited_countries_user_id ON visited_countries(user_id)",
];

const SQLITE_SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        color TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS countries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        country_code TEXT NOT NULL,
        country_name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS visited_countries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        country_code TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_visited_countries_user_id ON visited_countries(user_id)",
];

#[derive(Clone)]
pub struct DatabaseManager {
    #[cfg(feature = "postgres")]
    postgres_pool: Option<Pool>,
    #[cfg(feature = "sqlite")]
    sqlite_path: Option<Arc<String>>,
    user_store: Arc<dyn UserStore>,
    country_store: Arc<dyn CountryStore>,
    visit_store: Arc<dyn VisitStore>,
    db_type: DbType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbType {
    Postgres,
    Sqlite,
}

impl From<ConfigDbType> for DbType {
    fn from(value: ConfigDbType) -> Self {
        match value {
            ConfigDbType::Postgres => DbType::Postgres,
            ConfigDbType::Sqlite => DbType::Sqlite,
        }
    }
}

impl DatabaseManager {
    pub async fn new(config: &ConfigDatabaseConfig) -> Result<Self, DatabaseError> {
        let db_type = DbType::from(config.db_type());

        match db_type {
            #[cfg(feature = "postgres")]
            DbType::Postgres => {
                let connection_string = config.connection_string().ok_or_else(|| {
                    DatabaseError::Connection("no postgres connection configured".to_string())
                })?;
                let max_connections = config.max_connections();
                let min_connections = config.min_connections();

                let manager =
                    ConnectionManager::<PgConnection>::new(connection_string.expose_secret());

                let builder = r2d2::Pool::builder()
                    .max_size(max_connections.unwrap_or(10))
                    .min_idle(Some(min_connections.unwrap_or(1)));

                let pool = tokio::task::spawn_blocking(move || builder.build(manager))
                    .await
                    .map_err(|e| DatabaseError::Connection(format!("pool task failed: {e}")))?
                    .map_err(|e| DatabaseError::Connection(e.to_string()))?;

                info!("connected to postgres");

                Ok(Self {
                    user_store: Arc::new(PostgresUserStore::new(pool.clone())),
                    country_store: Arc::new(PostgresCountryStore::new(pool.clone())),
                    visit_store: Arc::new(PostgresVisitStore::new(pool.clone())),
                    postgres_pool: Some(pool),
                    #[cfg(feature = "sqlite")]
                    sqlite_path: None,
                    db_type,
                })
            }
            #[cfg(feature = "sqlite")]
            DbType::Sqlite => {
                let path = config.sqlite_path().ok_or_else(|| {
                    DatabaseError::Connection("no sqlite path configured".to_string())
                })?;
                let path = Arc::new(path);

                info!("using sqlite database at {}", path);

                Ok(Self {
                    #[cfg(feature = "postgres")]
                    postgres_pool: None,
                    user_store: Arc::new(SqliteUserStore::new(path.clone())),
                    country_store: Arc::new(SqliteCountryStore::new(path.clone())),
                    visit_store: Arc::new(SqliteVisitStore::new(path.clone())),
                    sqlite_path: Some(path),
                    db_type,
                })
            }
            #[cfg(not(feature = "postgres"))]
            DbType::Postgres => Err(DatabaseError::Connection(
                "PostgreSQL feature not enabled".to_string(),
            )),
            #[cfg(not(feature = "sqlite"))]
            DbType::Sqlite => Err(DatabaseError::Connection(
                "SQLite feature not enabled".to_string(),
            )),
        }
    }

    /// Creates the tracker tables when they are missing. Existing tables are
    /// left untouched.
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        let statements = match self.db_type {
            DbType::Postgres => POSTGRES_SCHEMA,
            DbType::Sqlite => SQLITE_SCHEMA,
        };

        self.run_statements(&statements)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;

        debug!("database schema ensured");
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), DatabaseError> {
        self.run_statements(&["SELECT 1"]).await
    }

    async fn run_statements(&self, statements: &[&'static str]) -> Result<(), DatabaseError> {
        let statements = statements.to_vec();

        match self.db_type {
            #[cfg(feature = "postgres")]
            DbType::Postgres => {
                let pool = self.postgres_pool.clone().ok_or_else(|| {
                    DatabaseError::Connection("postgres pool is not initialized".to_string())
                })?;
                tokio::task::spawn_blocking(move || {
                    let mut conn = pool
                        .get()
                        .map_err(|e| DatabaseError::Connection(e.to_string()))?;
                    for statement in statements {
                        diesel::sql_query(statement)
                            .execute(&mut conn)
                            .map_err(|e| DatabaseError::Query(e.to_string()))?;
                    }
                    Ok(())
                })
                .await
                .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
            }
            #[cfg(feature = "sqlite")]
            DbType::Sqlite => {
                use diesel::RunQueryDsl;

                let path = self.sqlite_path.clone().ok_or_else(|| {
                    DatabaseError::Connection("sqlite path is not initialized".to_string())
                })?;
                tokio::task::spawn_blocking(move || {
                    let mut conn = establish_connection(&path)?;
                    for statement in statements {
                        diesel::sql_query(statement)
                            .execute(&mut conn)
                            .map_err(|e| DatabaseError::Query(e.to_string()))?;
                    }
                    Ok(())
                })
                .await
                .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
            }
            #[cfg(not(feature = "postgres"))]
            DbType::Postgres => Err(DatabaseError::Connection(
                "PostgreSQL feature not enabled".to_string(),
            )),
            #[cfg(not(feature = "sqlite"))]
            DbType::Sqlite => Err(DatabaseError::Connection(
                "SQLite feature not enabled".to_string(),
            )),
        }
    }

    pub fn user_store(&self) -> Arc<dyn UserStore> {
        self.user_store.clone()
    }

    pub fn country_store(&self) -> Arc<dyn CountryStore> {
        self.country_store.clone()
    }

    pub fn visit_store(&self) -> Arc<dyn VisitStore> {
        self.visit_store.clone()
    }

    pub fn db_type(&self) -> DbType {
        self.db_type
    }
}
