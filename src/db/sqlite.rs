use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::rows::{DbCountry, DbUser, NewUser, NewVisit};
use crate::db::schema::{countries, users, visited_countries};

use super::{
    DatabaseError,
    models::{Country, User, VisitedCountry},
};

diesel::define_sql_function!(fn last_insert_rowid() -> diesel::sql_types::BigInt);

pub(crate) fn establish_connection(path: &str) -> Result<SqliteConnection, DatabaseError> {
    SqliteConnection::establish(path).map_err(|e| DatabaseError::Connection(e.to_string()))
}

async fn with_connection<T, F>(db_path: Arc<String>, operation: F) -> Result<T, DatabaseError>
where
    T: Send + 'static,
    F: FnOnce(&mut SqliteConnection) -> Result<T, DatabaseError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut conn = establish_connection(&db_path)?;
        operation(&mut conn)
    })
    .await
    .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
}

pub struct SqliteUserStore {
    db_path: Arc<String>,
}

impl SqliteUserStore {
    pub fn new(db_path: Arc<String>) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl super::UserStore for SqliteUserStore {
    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        with_connection(self.db_path.clone(), move |conn| {
            users::table
                .order(users::id.asc())
                .select(DbUser::as_select())
                .load::<DbUser>(conn)
                .map(|rows| rows.into_iter().map(Into::into).collect())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }

    async fn get_user(&self, user_id: i32) -> Result<Option<User>, DatabaseError> {
        with_connection(self.db_path.clone(), move |conn| {
            users::table
                .filter(users::id.eq(user_id))
                .select(DbUser::as_select())
                .first::<DbUser>(conn)
                .optional()
                .map(|value| value.map(Into::into))
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }

    async fn create_user(&self, name: &str, color: &str) -> Result<User, DatabaseError> {
        let name = name.to_string();
        let color = color.to_string();
        with_connection(self.db_path.clone(), move |conn| {
            let new_user = NewUser {
                name: &name,
                color: &color,
            };

            // last_insert_rowid is per connection, so read it inside the
            // same transaction as the insert.
            let rowid = conn
                .transaction::<_, diesel::result::Error, _>(|conn| {
                    diesel::insert_into(users::table)
                        .values(&new_user)
                        .execute(conn)?;
                    diesel::select(last_insert_rowid()).get_result::<i64>(conn)
                })
                .map_err(|e| DatabaseError::Query(e.to_string()))?;

            let id = i32::try_from(rowid)
                .map_err(|_| DatabaseError::Query(format!("user id {rowid} out of range")))?;

            Ok(User { id, name, color })
        })
        .await
    }
}

pub struct SqliteCountryStore {
    db_path: Arc<String>,
}

impl SqliteCountryStore {
    pub fn new(db_path: Arc<String>) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl super::CountryStore for SqliteCountryStore {
    async fn find_countries_containing(
        &self,
        needle: &str,
    ) -> Result<Vec<Country>, DatabaseError> {
        // SQLite's lower() and LIKE only fold ASCII, so case folding happens
        // here over the full reference table.
        let needle = needle.to_lowercase();
        with_connection(self.db_path.clone(), move |conn| {
            countries::table
                .order(countries::country_name.asc())
                .select(DbCountry::as_select())
                .load::<DbCountry>(conn)
                .map(|rows| {
                    rows.into_iter()
                        .map(Country::from)
                        .filter(|country| country.country_name.to_lowercase().contains(&needle))
                        .collect()
                })
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }
}

pub struct SqliteVisitStore {
    db_path: Arc<String>,
}

impl SqliteVisitStore {
    pub fn new(db_path: Arc<String>) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl super::VisitStore for SqliteVisitStore {
    async fn list_visited_country_codes(
        &self,
        user_id: i32,
    ) -> Result<Vec<String>, DatabaseError> {
        with_connection(self.db_path.clone(), move |conn| {
            visited_countries::table
                .filter(visited_countries::user_id.eq(user_id))
                .order(visited_countries::id.asc())
                .select(visited_countries::country_code)
                .load::<String>(conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }

    async fn record_visit(&self, visit: &VisitedCountry) -> Result<(), DatabaseError> {
        let visit = visit.clone();
        with_connection(self.db_path.clone(), move |conn| {
            diesel::insert_into(visited_countries::table)
                .values(&NewVisit::from(&visit))
                .execute(conn)
                .map(|_| ())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }
}
