use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::db::manager::Pool;
use crate::db::rows::{DbCountry, DbUser, NewUser, NewVisit};
use crate::db::schema::{countries, lower, users, visited_countries};
use crate::db::stores::contains_pattern;

use super::{
    DatabaseError,
    models::{Country, User, VisitedCountry},
};

async fn with_connection<T, F>(pool: Pool, operation: F) -> Result<T, DatabaseError>
where
    T: Send + 'static,
    F: FnOnce(&mut PgConnection) -> Result<T, DatabaseError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        operation(&mut conn)
    })
    .await
    .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
}

pub struct PostgresUserStore {
    pool: Pool,
}

impl PostgresUserStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl super::UserStore for PostgresUserStore {
    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let pool = self.pool.clone();
        with_connection(pool, move |conn| {
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
        let pool = self.pool.clone();
        with_connection(pool, move |conn| {
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
        let pool = self.pool.clone();
        let name = name.to_string();
        let color = color.to_string();
        with_connection(pool, move |conn| {
            let new_user = NewUser {
                name: &name,
                color: &color,
            };

            diesel::insert_into(users::table)
                .values(&new_user)
                .returning(DbUser::as_returning())
                .get_result::<DbUser>(conn)
                .map(Into::into)
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }
}

pub struct PostgresCountryStore {
    pool: Pool,
}

impl PostgresCountryStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl super::CountryStore for PostgresCountryStore {
    async fn find_countries_containing(
        &self,
        needle: &str,
    ) -> Result<Vec<Country>, DatabaseError> {
        let pool = self.pool.clone();
        let pattern = contains_pattern(needle);
        with_connection(pool, move |conn| {
            countries::table
                .filter(lower(countries::country_name).like(pattern).escape('\\'))
                .order(countries::country_name.asc())
                .select(DbCountry::as_select())
                .load::<DbCountry>(conn)
                .map(|rows| rows.into_iter().map(Into::into).collect())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }
}

pub struct PostgresVisitStore {
    pool: Pool,
}

impl PostgresVisitStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl super::VisitStore for PostgresVisitStore {
    async fn list_visited_country_codes(
        &self,
        user_id: i32,
    ) -> Result<Vec<String>, DatabaseError> {
        let pool = self.pool.clone();
        with_connection(pool, move |conn| {
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
        let pool = self.pool.clone();
        let visit = visit.clone();
        with_connection(pool, move |conn| {
            diesel::insert_into(visited_countries::table)
                .values(&NewVisit::from(&visit))
                .execute(conn)
                .map(|_| ())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }
}
