use async_trait::async_trait;

use super::DatabaseError;
use super::models::{Country, User, VisitedCountry};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Every user, ordered by id.
    async fn list_users(&self) -> Result<Vec<User>, DatabaseError>;
    async fn get_user(&self, id: i32) -> Result<Option<User>, DatabaseError>;
    /// Inserts a user and returns it with the generated id.
    async fn create_user(&self, name: &str, color: &str) -> Result<User, DatabaseError>;
}

#[async_trait]
pub trait CountryStore: Send + Sync {
    /// Countries whose lower-cased name contains `needle`, ordered by name.
    /// `needle` is expected to be lower-case already.
    async fn find_countries_containing(&self, needle: &str)
    -> Result<Vec<Country>, DatabaseError>;
}

#[async_trait]
pub trait VisitStore: Send + Sync {
    /// Visited country codes for `user_id` in insertion order.
    async fn list_visited_country_codes(&self, user_id: i32)
    -> Result<Vec<String>, DatabaseError>;
    async fn record_visit(&self, visit: &VisitedCountry) -> Result<(), DatabaseError>;
}

/// Builds a `LIKE` pattern matching any value containing `needle` literally.
#[cfg(feature = "postgres")]
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(all(test, feature = "postgres"))]
mod tests {
    use super::contains_pattern;

    #[test]
    fn contains_pattern_wraps_needle() {
        assert_eq!(contains_pattern("franc"), "%franc%");
    }

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("a%b_c\\"), "%a\\%b\\_c\\\\%");
    }
}
