pub use self::error::DatabaseError;
pub use self::manager::DatabaseManager;
pub use self::models::{Country, User, VisitedCountry};
pub use self::stores::{CountryStore, UserStore, VisitStore};

pub mod error;
pub mod manager;
pub mod models;
pub mod rows;
pub mod schema;
pub mod stores;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(all(test, feature = "sqlite"))]
pub(crate) mod test_support;
