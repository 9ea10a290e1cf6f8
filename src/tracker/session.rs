use std::collections::HashMap;

use parking_lot::RwLock;
use uuid::Uuid;

/// Opaque per-client session token carried in a cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Maps session tokens to the user each client is currently viewing.
///
/// Only sessions bound to a user other than the default are held, so
/// requests that never switch users leave the map untouched. Existence of
/// the bound user is not checked here.
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, i32>>,
    default_user_id: i32,
}

impl SessionStore {
    pub fn new(default_user_id: i32) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            default_user_id,
        }
    }

    /// Mints a fresh token. It reads as the default user until rebound.
    pub fn open(&self) -> SessionId {
        SessionId(Uuid::new_v4())
    }

    /// Whether the session is bound to a user other than the default.
    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.read().contains_key(id)
    }

    pub fn current_user_id(&self, id: &SessionId) -> i32 {
        self.sessions
            .read()
            .get(id)
            .copied()
            .unwrap_or(self.default_user_id)
    }

    pub fn set_current_user(&self, id: SessionId, user_id: i32) {
        let mut sessions = self.sessions.write();
        if user_id == self.default_user_id {
            sessions.remove(&id);
        } else {
            sessions.insert(id, user_id);
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionId, SessionStore};

    #[test]
    fn open_reads_default_user_without_holding_state() {
        let store = SessionStore::new(1);
        let id = store.open();

        assert!(!store.contains(&id));
        assert_eq!(store.current_user_id(&id), 1);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn binding_back_to_default_releases_the_session() {
        let store = SessionStore::new(1);
        let id = store.open();

        store.set_current_user(id, 4);
        assert!(store.contains(&id));
        assert_eq!(store.len(), 1);

        store.set_current_user(id, 1);
        assert!(!store.contains(&id));
        assert_eq!(store.current_user_id(&id), 1);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn many_unbound_sessions_hold_nothing() {
        let store = SessionStore::new(1);
        for _ in 0..500 {
            let id = store.open();
            store.set_current_user(id, 1);
            assert_eq!(store.current_user_id(&id), 1);
        }
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn sessions_are_isolated() {
        let store = SessionStore::new(1);
        let first = store.open();
        let second = store.open();

        store.set_current_user(first, 7);

        assert_eq!(store.current_user_id(&first), 7);
        assert_eq!(store.current_user_id(&second), 1);
    }

    #[test]
    fn unknown_session_reads_default() {
        let store = SessionStore::new(3);
        let stray = SessionId::parse("6f1c0a56-3b8e-4c61-9d0e-2a7f5b9c1d22").expect("uuid");

        assert!(!store.contains(&stray));
        assert_eq!(store.current_user_id(&stray), 3);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(SessionId::parse("not-a-token").is_none());
        assert!(SessionId::parse("").is_none());
    }

    #[test]
    fn parse_roundtrips_display() {
        let store = SessionStore::new(1);
        let id = store.open();
        assert_eq!(SessionId::parse(&id.to_string()), Some(id));
    }
}
