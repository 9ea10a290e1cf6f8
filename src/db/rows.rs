use diesel::prelude::*;

use super::models::{Country, User, VisitedCountry};
use super::schema::{countries, users, visited_countries};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
pub(crate) struct DbUser {
    id: i32,
    name: String,
    color: String,
}

impl From<DbUser> for User {
    fn from(value: DbUser) -> Self {
        Self {
            id: value.id,
            name: value.name,
            color: value.color,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUser<'a> {
    pub(crate) name: &'a str,
    pub(crate) color: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = countries)]
pub(crate) struct DbCountry {
    country_code: String,
    country_name: String,
}

impl From<DbCountry> for Country {
    fn from(value: DbCountry) -> Self {
        Self {
            country_code: value.country_code,
            country_name: value.country_name,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = visited_countries)]
pub(crate) struct NewVisit<'a> {
    user_id: i32,
    country_code: &'a str,
}

impl<'a> From<&'a VisitedCountry> for NewVisit<'a> {
    fn from(value: &'a VisitedCountry) -> Self {
        Self {
            user_id: value.user_id,
            country_code: &value.country_code,
        }
    }
}
