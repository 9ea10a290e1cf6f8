use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::db::{Country, DatabaseError, DatabaseManager, User, VisitedCountry};

pub mod matching;
pub mod session;

pub use self::session::{SessionId, SessionStore};

const MAX_NAME_LEN: usize = 64;
const MAX_COLOR_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("user {0} does not exist")]
    UserNotFound(i32),
    #[error("{0}")]
    InvalidInput(String),
}

/// Everything the index page needs for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexView {
    pub countries: Vec<String>,
    pub total: usize,
    pub users: Vec<User>,
    pub current: User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOutcome {
    Ready(IndexView),
    NoUsers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Recorded(Country),
    NoMatch,
    NoUser,
}

pub struct TrackerCore {
    db_manager: Arc<DatabaseManager>,
    sessions: SessionStore,
}

impl TrackerCore {
    pub fn new(db_manager: Arc<DatabaseManager>, default_user_id: i32) -> Self {
        Self {
            db_manager,
            sessions: SessionStore::new(default_user_id),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn list_visited_country_codes(
        &self,
        user_id: i32,
    ) -> Result<Vec<String>, TrackerError> {
        Ok(self
            .db_manager
            .visit_store()
            .list_visited_country_codes(user_id)
            .await?)
    }

    /// Reads the whole roster from the store and picks out `current_user_id`.
    pub async fn list_users_and_find_current(
        &self,
        current_user_id: i32,
    ) -> Result<(Vec<User>, Option<User>), TrackerError> {
        let users = self.db_manager.user_store().list_users().await?;
        let current = users.iter().find(|u| u.id == current_user_id).cloned();
        Ok((users, current))
    }

    pub async fn find_country_by_fuzzy_name(
        &self,
        input: &str,
    ) -> Result<Option<Country>, TrackerError> {
        let Some(needle) = matching::normalize_query(input) else {
            return Ok(None);
        };

        let candidates = self
            .db_manager
            .country_store()
            .find_countries_containing(&needle)
            .await?;

        Ok(matching::best_match(&needle, candidates))
    }

    /// Resolves the session's user, falling back to the first user in the
    /// roster when its id no longer exists. Held sessions are rebound to the
    /// fallback; unbound ones keep reading the default.
    async fn resolve_current_user(
        &self,
        session: SessionId,
    ) -> Result<(Vec<User>, Option<User>), TrackerError> {
        let requested = self.sessions.current_user_id(&session);
        let (users, current) = self.list_users_and_find_current(requested).await?;

        if current.is_some() {
            return Ok((users, current));
        }

        let fallback = users.first().cloned();
        if let Some(ref user) = fallback {
            debug!(
                "session {} pointed at missing user {}, falling back to {}",
                session, requested, user.id
            );
            if self.sessions.contains(&session) {
                self.sessions.set_current_user(session, user.id);
            }
        }
        Ok((users, fallback))
    }

    pub async fn index(&self, session: SessionId) -> Result<IndexOutcome, TrackerError> {
        let (users, current) = self.resolve_current_user(session).await?;
        let Some(current) = current else {
            return Ok(IndexOutcome::NoUsers);
        };

        let countries = self.list_visited_country_codes(current.id).await?;
        Ok(IndexOutcome::Ready(IndexView {
            total: countries.len(),
            countries,
            users,
            current,
        }))
    }

    pub async fn add_country(
        &self,
        session: SessionId,
        input: &str,
    ) -> Result<AddOutcome, TrackerError> {
        let Some(country) = self.find_country_by_fuzzy_name(input).await? else {
            debug!("no country matches {:?}", input);
            return Ok(AddOutcome::NoMatch);
        };

        let (_, current) = self.resolve_current_user(session).await?;
        let Some(user) = current else {
            return Ok(AddOutcome::NoUser);
        };

        self.db_manager
            .visit_store()
            .record_visit(&VisitedCountry {
                user_id: user.id,
                country_code: country.country_code.clone(),
            })
            .await?;

        info!(
            "recorded visit to {} ({}) for user {}",
            country.country_name, country.country_code, user.id
        );
        Ok(AddOutcome::Recorded(country))
    }

    pub async fn switch_user(
        &self,
        session: SessionId,
        user_id: i32,
    ) -> Result<User, TrackerError> {
        let user = self
            .db_manager
            .user_store()
            .get_user(user_id)
            .await?
            .ok_or(TrackerError::UserNotFound(user_id))?;

        self.sessions.set_current_user(session, user.id);
        info!("session {} switched to user {}", session, user.id);
        Ok(user)
    }

    pub async fn create_user(
        &self,
        session: SessionId,
        name: &str,
        color: &str,
    ) -> Result<User, TrackerError> {
        let (name, color) = validate_new_user(name, color)?;
        let user = self
            .db_manager
            .user_store()
            .create_user(&name, &color)
            .await?;

        self.sessions.set_current_user(session, user.id);
        info!("created user {} ({}) with color {}", user.id, user.name, user.color);
        Ok(user)
    }
}

fn validate_new_user(name: &str, color: &str) -> Result<(String, String), TrackerError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TrackerError::InvalidInput("name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(TrackerError::InvalidInput(format!(
            "name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }

    // The color ends up inside inline CSS.
    let color = color.trim();
    if color.is_empty() {
        return Err(TrackerError::InvalidInput("color cannot be empty".to_string()));
    }
    if color.len() > MAX_COLOR_LEN
        || !color.chars().all(|c| c.is_ascii_alphanumeric() || c == '#')
    {
        return Err(TrackerError::InvalidInput(format!(
            "invalid color {:?}",
            color
        )));
    }

    Ok((name.to_string(), color.to_string()))
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::validate_new_user;

    #[test_case("Ana", "red" ; "plain name and color")]
    #[test_case("  Ana  ", " teal " ; "surrounding whitespace")]
    #[test_case("Zoë", "#ff8800" ; "unicode name and hex color")]
    fn validate_new_user_accepts(name: &str, color: &str) {
        let (clean_name, clean_color) = validate_new_user(name, color).expect("valid");
        assert_eq!(clean_name, name.trim());
        assert_eq!(clean_color, color.trim());
    }

    #[test_case("", "red" ; "empty name")]
    #[test_case("   ", "red" ; "blank name")]
    #[test_case("Ana", "" ; "empty color")]
    #[test_case("Ana", "red; background: url(x)" ; "css injection")]
    #[test_case("Ana", "\"><script>" ; "markup in color")]
    fn validate_new_user_rejects(name: &str, color: &str) {
        assert!(validate_new_user(name, color).is_err());
    }

    #[test]
    fn validate_new_user_rejects_long_names() {
        let name = "a".repeat(65);
        assert!(validate_new_user(&name, "red").is_err());
        assert!(validate_new_user(&"a".repeat(64), "red").is_ok());
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod core_tests {
    use super::{AddOutcome, IndexOutcome, IndexView, TrackerCore, TrackerError};
    use crate::db::test_support::TestDatabase;

    async fn core_with_countries() -> (TestDatabase, TrackerCore) {
        let db = TestDatabase::new().await;
        db.seed_countries(&[
            ("FR", "France"),
            ("GF", "French Guiana"),
            ("JP", "Japan"),
            ("IN", "India"),
            ("IO", "British Indian Ocean Territory"),
        ]);
        let core = TrackerCore::new(db.manager.clone(), 1);
        (db, core)
    }

    fn ready(outcome: IndexOutcome) -> IndexView {
        match outcome {
            IndexOutcome::Ready(view) => view,
            IndexOutcome::NoUsers => panic!("expected users to exist"),
        }
    }

    #[tokio::test]
    async fn index_without_users_asks_for_one() {
        let (_db, core) = core_with_countries().await;
        let session = core.sessions().open();

        let outcome = core.index(session).await.expect("index");
        assert_eq!(outcome, IndexOutcome::NoUsers);
    }

    #[tokio::test]
    async fn fuzzy_add_records_one_visit_for_current_user() {
        let (_db, core) = core_with_countries().await;
        let session = core.sessions().open();
        let ana = core.create_user(session, "Ana", "red").await.expect("create");

        let outcome = core.add_country(session, "franc").await.expect("add");
        match outcome {
            AddOutcome::Recorded(country) => assert_eq!(country.country_code, "FR"),
            other => panic!("unexpected outcome {:?}", other),
        }

        let view = ready(core.index(session).await.expect("index"));
        assert_eq!(view.current, ana);
        assert_eq!(view.total, 1);
        assert_eq!(view.countries, vec!["FR"]);
    }

    #[tokio::test]
    async fn unmatched_add_is_a_no_op() {
        let (_db, core) = core_with_countries().await;
        let session = core.sessions().open();
        core.create_user(session, "Ana", "red").await.expect("create");

        assert_eq!(
            core.add_country(session, "atlantis").await.expect("add"),
            AddOutcome::NoMatch
        );
        assert_eq!(
            core.add_country(session, "   ").await.expect("add blank"),
            AddOutcome::NoMatch
        );

        let view = ready(core.index(session).await.expect("index"));
        assert_eq!(view.total, 0);
    }

    #[tokio::test]
    async fn ambiguous_input_prefers_exact_name() {
        let (_db, core) = core_with_countries().await;

        let found = core
            .find_country_by_fuzzy_name("India")
            .await
            .expect("search")
            .expect("match");
        assert_eq!(found.country_code, "IN");
    }

    #[tokio::test]
    async fn fuzzy_lookup_ignores_non_ascii_case() {
        let db = TestDatabase::new().await;
        db.seed_countries(&[("AX", "Åland Islands"), ("AT", "Österreich")]);
        let core = TrackerCore::new(db.manager.clone(), 1);

        for input in ["åland", "Åland", "ÅLAND ISLANDS"] {
            let found = core
                .find_country_by_fuzzy_name(input)
                .await
                .expect("search")
                .unwrap_or_else(|| panic!("no match for {input}"));
            assert_eq!(found.country_code, "AX");
        }

        for input in ["österreich", "Österreich"] {
            let found = core
                .find_country_by_fuzzy_name(input)
                .await
                .expect("search")
                .unwrap_or_else(|| panic!("no match for {input}"));
            assert_eq!(found.country_code, "AT");
        }
    }

    #[tokio::test]
    async fn switching_users_shows_their_own_visits() {
        let (_db, core) = core_with_countries().await;
        let session = core.sessions().open();

        let ana = core.create_user(session, "Ana", "red").await.expect("ana");
        core.add_country(session, "japan").await.expect("add japan");
        let ben = core.create_user(session, "Ben", "teal").await.expect("ben");
        core.add_country(session, "france").await.expect("add france");

        core.switch_user(session, ana.id).await.expect("switch to ana");
        let view = ready(core.index(session).await.expect("index ana"));
        assert_eq!(view.current.color, "red");
        assert_eq!(view.countries, vec!["JP"]);
        assert_eq!(view.users.len(), 2);

        core.switch_user(session, ben.id).await.expect("switch to ben");
        let view = ready(core.index(session).await.expect("index ben"));
        assert_eq!(view.current.color, "teal");
        assert_eq!(view.countries, vec!["FR"]);
    }

    #[tokio::test]
    async fn switching_to_missing_user_fails_without_rebinding() {
        let (_db, core) = core_with_countries().await;
        let session = core.sessions().open();
        let ana = core.create_user(session, "Ana", "red").await.expect("ana");

        let err = core.switch_user(session, 999).await.expect_err("missing user");
        assert!(matches!(err, TrackerError::UserNotFound(999)));
        assert_eq!(core.sessions().current_user_id(&session), ana.id);
    }

    #[tokio::test]
    async fn new_user_becomes_current_with_empty_list() {
        let (_db, core) = core_with_countries().await;
        let session = core.sessions().open();
        core.create_user(session, "Ana", "red").await.expect("ana");
        core.add_country(session, "japan").await.expect("add japan");

        let ben = core.create_user(session, "Ben", "olive").await.expect("ben");
        let view = ready(core.index(session).await.expect("index"));

        assert_eq!(view.current, ben);
        assert_eq!(view.current.color, "olive");
        assert!(view.countries.is_empty());
    }

    #[tokio::test]
    async fn sessions_do_not_observe_each_other() {
        let (_db, core) = core_with_countries().await;
        let first = core.sessions().open();
        let second = core.sessions().open();

        let ana = core.create_user(first, "Ana", "red").await.expect("ana");
        let ben = core.create_user(second, "Ben", "teal").await.expect("ben");

        let first_view = ready(core.index(first).await.expect("first"));
        let second_view = ready(core.index(second).await.expect("second"));
        assert_eq!(first_view.current, ana);
        assert_eq!(second_view.current, ben);
    }

    #[tokio::test]
    async fn missing_default_user_falls_back_to_first() {
        let db = TestDatabase::new().await;
        let core = TrackerCore::new(db.manager.clone(), 42);
        let bootstrap = core.sessions().open();
        let ana = core.create_user(bootstrap, "Ana", "red").await.expect("ana");

        let fresh = core.sessions().open();
        assert_eq!(core.sessions().current_user_id(&fresh), 42);

        let view = ready(core.index(fresh).await.expect("index"));
        assert_eq!(view.current, ana);
        assert!(!core.sessions().contains(&fresh));

        let stale = core.sessions().open();
        core.sessions().set_current_user(stale, 999);
        let view = ready(core.index(stale).await.expect("index stale"));
        assert_eq!(view.current, ana);
        assert_eq!(core.sessions().current_user_id(&stale), ana.id);
    }

    #[tokio::test]
    async fn reads_and_adds_do_not_hold_sessions() {
        let (_db, core) = core_with_countries().await;
        let bootstrap = core.sessions().open();
        core.create_user(bootstrap, "Ana", "red").await.expect("ana");

        for _ in 0..50 {
            let session = core.sessions().open();
            core.index(session).await.expect("index");
            core.add_country(session, "france").await.expect("add");
        }

        assert_eq!(core.sessions().len(), 0);
    }

    #[tokio::test]
    async fn repeated_index_is_stable() {
        let (_db, core) = core_with_countries().await;
        let session = core.sessions().open();
        core.create_user(session, "Ana", "red").await.expect("ana");
        core.add_country(session, "japan").await.expect("add");

        let first = ready(core.index(session).await.expect("first"));
        let second = ready(core.index(session).await.expect("second"));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn invalid_new_user_is_rejected_before_insert() {
        let (_db, core) = core_with_countries().await;
        let session = core.sessions().open();

        let err = core.create_user(session, "  ", "red").await.expect_err("blank name");
        assert!(matches!(err, TrackerError::InvalidInput(_)));
        assert_eq!(core.index(session).await.expect("index"), IndexOutcome::NoUsers);
    }
}
