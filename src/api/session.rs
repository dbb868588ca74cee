//! Session credential and its persisted lifecycle
//!
//! A `SessionContext` is created at login and handed to every operation.
//! `SessionStore` persists it (plus the user's tag profile) in a
//! [`KeyValueStore`] and clears it on sign-out.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::errors::{ApiError, ApiResult};
use super::store::{KeyValueStore, StoreError};

pub const SESSION_KEY: &str = "session_key";
pub const USER_ID_KEY: &str = "user_id";
pub const USER_TAGS_KEY: &str = "user_tags";

/// Credential of the signed-in user
///
/// Immutable once built; clones share the token.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionContext {
    token: Arc<str>,
    user_id: u64,
}

impl SessionContext {
    /// Fails with `MissingSession` for an empty token or a zero user id
    pub fn new(token: impl Into<String>, user_id: u64) -> ApiResult<Self> {
        let token = token.into();
        if token.trim().is_empty() || user_id == 0 {
            return Err(ApiError::MissingSession);
        }
        Ok(Self {
            token: Arc::from(token),
            user_id,
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// How often the user has engaged with one interest tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagUsage {
    pub name: String,
    pub frequency: u32,
}

impl TagUsage {
    pub fn new(name: impl Into<String>, frequency: u32) -> Self {
        Self {
            name: name.into(),
            frequency,
        }
    }

    /// `"name: frequency"`
    pub fn flatten(&self) -> String {
        format!("{}: {}", self.name, self.frequency)
    }

    pub fn parse_flattened(raw: &str) -> ApiResult<Self> {
        let (name, frequency) = raw.rsplit_once(':').ok_or_else(|| ApiError::InvalidNumericFormat {
            field: "user_tags",
            value: raw.to_string(),
        })?;
        let frequency = frequency
            .trim()
            .parse::<u32>()
            .map_err(|_| ApiError::InvalidNumericFormat {
                field: "user_tags",
                value: raw.to_string(),
            })?;
        Ok(Self::new(name.trim(), frequency))
    }
}

/// Ordered tag history of the user, as returned at login
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserTagProfile {
    entries: Vec<TagUsage>,
}

impl UserTagProfile {
    pub fn new(entries: Vec<TagUsage>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[TagUsage] {
        &self.entries
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn frequencies(&self) -> Vec<u32> {
        self.entries.iter().map(|t| t.frequency).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_flattened(&self) -> Vec<String> {
        self.entries.iter().map(TagUsage::flatten).collect()
    }

    pub fn from_flattened<S: AsRef<str>>(raw: &[S]) -> ApiResult<Self> {
        let entries = raw
            .iter()
            .map(|s| TagUsage::parse_flattened(s.as_ref()))
            .collect::<ApiResult<Vec<_>>>()?;
        Ok(Self { entries })
    }
}

/// Session persistence on top of a key/value store
pub struct SessionStore<S: KeyValueStore> {
    backend: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Current session, or `MissingSession`
    pub fn get_session(&self) -> ApiResult<SessionContext> {
        let token = self.backend.get(SESSION_KEY).ok_or(ApiError::MissingSession)?;
        let user_id = self
            .backend
            .get(USER_ID_KEY)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .ok_or(ApiError::MissingSession)?;
        SessionContext::new(token, user_id)
    }

    /// Persisted tag profile; empty when none was stored
    pub fn tag_profile(&self) -> ApiResult<UserTagProfile> {
        let Some(raw) = self.backend.get(USER_TAGS_KEY) else {
            return Ok(UserTagProfile::default());
        };
        let flattened: Vec<String> = serde_json::from_str(&raw).map_err(|e| ApiError::Decode {
            reason: e.to_string(),
            snippet: raw.clone(),
        })?;
        UserTagProfile::from_flattened(&flattened)
    }

    /// Persist the session created at login
    pub fn set_session(
        &mut self,
        session: &SessionContext,
        tags: &UserTagProfile,
    ) -> Result<(), StoreError> {
        let flattened = serde_json::to_string(&tags.to_flattened())?;
        self.backend.set_all(vec![
            (SESSION_KEY, session.token().to_string()),
            (USER_ID_KEY, session.user_id().to_string()),
            (USER_TAGS_KEY, flattened),
        ])?;
        info!(user_id = session.user_id(), tags = tags.len(), "Session stored");
        Ok(())
    }

    /// Remove every persisted session entry
    ///
    /// Every key is attempted; the first failure is returned.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        let mut first_error = None;
        for key in [SESSION_KEY, USER_ID_KEY, USER_TAGS_KEY] {
            if let Err(e) = self.backend.remove(key) {
                warn!(key, error = %e, "Failed to remove session entry");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => {
                debug!("Session cleared");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::store::MemoryStore;

    fn session() -> SessionContext {
        SessionContext::new("abc-123", 7).unwrap()
    }

    #[test]
    fn test_session_context_requires_token_and_user() {
        assert!(matches!(
            SessionContext::new("", 7),
            Err(ApiError::MissingSession)
        ));
        assert!(matches!(
            SessionContext::new("   ", 7),
            Err(ApiError::MissingSession)
        ));
        assert!(matches!(
            SessionContext::new("abc", 0),
            Err(ApiError::MissingSession)
        ));
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let debug = format!("{:?}", session());
        assert!(!debug.contains("abc-123"), "Got: {}", debug);
        assert!(debug.contains("user_id: 7"));
    }

    #[test]
    fn test_session_clones_share_token() {
        let a = session();
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(b.token(), "abc-123");
    }

    #[test]
    fn test_tag_flatten_round_trip() {
        let profile = UserTagProfile::new(vec![
            TagUsage::new("deporte", 3),
            TagUsage::new("salud: mental", 1),
        ]);
        let flattened = profile.to_flattened();
        assert_eq!(flattened, vec!["deporte: 3", "salud: mental: 1"]);
        assert_eq!(UserTagProfile::from_flattened(&flattened).unwrap(), profile);
    }

    #[test]
    fn test_tag_parallel_views() {
        let profile = UserTagProfile::new(vec![
            TagUsage::new("deporte", 3),
            TagUsage::new("nutricion", 5),
        ]);
        assert_eq!(profile.names(), vec!["deporte", "nutricion"]);
        assert_eq!(profile.frequencies(), vec![3, 5]);
    }

    #[test]
    fn test_tag_invalid_frequency() {
        assert!(matches!(
            TagUsage::parse_flattened("deporte: muchas"),
            Err(ApiError::InvalidNumericFormat { field: "user_tags", .. })
        ));
        assert!(TagUsage::parse_flattened("deporte").is_err());
    }

    #[test]
    fn test_store_missing_session() {
        let store = SessionStore::new(MemoryStore::new());
        assert!(matches!(store.get_session(), Err(ApiError::MissingSession)));
        assert!(store.tag_profile().unwrap().is_empty());
    }

    #[test]
    fn test_store_set_and_clear() {
        let mut store = SessionStore::new(MemoryStore::new());
        let tags = UserTagProfile::new(vec![TagUsage::new("deporte", 3)]);
        store.set_session(&session(), &tags).unwrap();

        assert_eq!(store.get_session().unwrap(), session());
        assert_eq!(store.tag_profile().unwrap(), tags);
        assert_eq!(
            store.backend().get(USER_TAGS_KEY).as_deref(),
            Some(r#"["deporte: 3"]"#)
        );

        store.clear().unwrap();
        assert!(matches!(store.get_session(), Err(ApiError::MissingSession)));
        assert!(store.tag_profile().unwrap().is_empty());
    }

    /// Backend whose writes or removals of the listed keys fail
    #[derive(Default)]
    struct FailingStore {
        inner: MemoryStore,
        failing_sets: Vec<&'static str>,
        failing_removes: Vec<&'static str>,
    }

    fn io_error() -> StoreError {
        StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
    }

    impl KeyValueStore for FailingStore {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
            if self.failing_sets.iter().any(|k| *k == key) {
                return Err(io_error());
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            if self.failing_removes.iter().any(|k| *k == key) {
                return Err(io_error());
            }
            self.inner.remove(key)
        }
    }

    fn stored(token: &str, user_id: &str) -> MemoryStore {
        let mut inner = MemoryStore::new();
        inner.set(SESSION_KEY, token.to_string()).unwrap();
        inner.set(USER_ID_KEY, user_id.to_string()).unwrap();
        inner.set(USER_TAGS_KEY, "[]".to_string()).unwrap();
        inner
    }

    #[test]
    fn test_failed_set_session_leaves_no_partial_session() {
        let mut store = SessionStore::new(FailingStore {
            failing_sets: vec![USER_ID_KEY],
            ..FailingStore::default()
        });
        let tags = UserTagProfile::new(vec![TagUsage::new("deporte", 3)]);

        assert!(store.set_session(&session(), &tags).is_err());
        assert_eq!(store.backend().get(SESSION_KEY), None);
        assert_eq!(store.backend().get(USER_ID_KEY), None);
        assert_eq!(store.backend().get(USER_TAGS_KEY), None);
    }

    #[test]
    fn test_failed_set_session_restores_previous_session() {
        let mut store = SessionStore::new(FailingStore {
            inner: stored("old-key", "5"),
            failing_sets: vec![USER_TAGS_KEY],
            ..FailingStore::default()
        });

        assert!(store.set_session(&session(), &UserTagProfile::default()).is_err());
        let kept = store.get_session().unwrap();
        assert_eq!(kept.token(), "old-key");
        assert_eq!(kept.user_id(), 5);
    }

    #[test]
    fn test_clear_attempts_every_key() {
        let mut store = SessionStore::new(FailingStore {
            inner: stored("abc-123", "7"),
            failing_removes: vec![SESSION_KEY],
            ..FailingStore::default()
        });

        assert!(matches!(store.clear(), Err(StoreError::Io(_))));
        assert_eq!(store.backend().get(USER_ID_KEY), None);
        assert_eq!(store.backend().get(USER_TAGS_KEY), None);
    }

    #[test]
    fn test_store_non_numeric_user_id_is_missing() {
        let mut backend = MemoryStore::new();
        backend.set(SESSION_KEY, "abc".to_string()).unwrap();
        backend.set(USER_ID_KEY, "siete".to_string()).unwrap();
        let store = SessionStore::new(backend);
        assert!(matches!(store.get_session(), Err(ApiError::MissingSession)));
    }
}
