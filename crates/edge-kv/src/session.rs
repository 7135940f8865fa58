//! Session management using the key-value store.

use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{Cache, CacheError};

/// A unique session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new session ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random, URL-safe session ID.
    pub fn generate() -> Self {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        use rand::Rng;

        let bytes: [u8; 18] = rand::thread_rng().gen();
        Self(format!("sess_{}", URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Parse an ID received from a client, rejecting anything that could
    /// not have come from `generate`.
    pub fn parse(raw: &str) -> Option<Self> {
        let body = raw.strip_prefix("sess_")?;
        let valid = body.len() == 24
            && body
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        valid.then(|| Self(raw.to_string()))
    }

    /// Get the session ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session data stored in the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData<T> {
    pub id: SessionId,
    /// User-defined session data.
    pub data: T,
    /// Incremented on every write.
    pub version: u64,
    /// Unix timestamp.
    pub created_at: i64,
    /// Unix timestamp.
    pub updated_at: i64,
}

/// Typed session store.
///
/// With a TTL, every write pushes the session's expiry forward.
///
/// ```rust,ignore
/// let sessions = Session::<VisitorState>::new(cache).with_ttl(Duration::from_secs(86_400));
/// let id = SessionId::generate();
/// let state = sessions.get_or_default(&id)?;
/// sessions.update(&id, |s| s.shown_intro = true)?;
/// ```
#[derive(Clone)]
pub struct Session<T> {
    cache: Cache,
    ttl: Option<Duration>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Session<T>
where
    T: Serialize + DeserializeOwned + Default + Clone,
{
    pub fn new(cache: Cache) -> Self {
        Self {
            cache,
            ttl: None,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Let the store drop sessions idle for longer than `ttl`.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Get session data, or the default when the session doesn't exist.
    ///
    /// Nothing is written for a missing session.
    pub fn get_or_default(&self, id: &SessionId) -> Result<T, CacheError> {
        Ok(self.get(id)?.unwrap_or_default())
    }

    /// Get session data if it exists.
    pub fn get(&self, id: &SessionId) -> Result<Option<T>, CacheError> {
        Ok(self.stored(id)?.map(|s| s.data))
    }

    /// Set session data (unconditional write).
    pub fn set(&self, id: &SessionId, data: &T) -> Result<(), CacheError> {
        let current = self.stored(id)?;
        self.write(id, data.clone(), current.as_ref())
    }

    /// Read, modify and write session data. Missing sessions start from
    /// the default. Returns the written data.
    pub fn update<F>(&self, id: &SessionId, f: F) -> Result<T, CacheError>
    where
        F: FnOnce(&mut T),
    {
        let current = self.stored(id)?;
        let mut data = current
            .as_ref()
            .map(|s| s.data.clone())
            .unwrap_or_default();
        f(&mut data);
        self.write(id, data.clone(), current.as_ref())?;
        Ok(data)
    }

    /// Delete a session.
    pub fn delete(&self, id: &SessionId) -> Result<(), CacheError> {
        self.cache.delete(&session_key(id))
    }

    /// Check if a session exists.
    pub fn exists(&self, id: &SessionId) -> Result<bool, CacheError> {
        self.cache.exists(&session_key(id))
    }

    fn stored(&self, id: &SessionId) -> Result<Option<SessionData<T>>, CacheError> {
        self.cache.get::<SessionData<T>>(&session_key(id))
    }

    fn write(
        &self,
        id: &SessionId,
        data: T,
        current: Option<&SessionData<T>>,
    ) -> Result<(), CacheError> {
        let now = chrono::Utc::now().timestamp();
        let session_data = SessionData {
            id: id.clone(),
            data,
            version: current.map(|s| s.version + 1).unwrap_or(1),
            created_at: current.map(|s| s.created_at).unwrap_or(now),
            updated_at: now,
        };
        match self.ttl {
            Some(ttl) => self.cache.set_with_ttl(&session_key(id), &session_data, ttl),
            None => self.cache.set(&session_key(id), &session_data),
        }
    }
}

fn session_key(id: &SessionId) -> String {
    crate::cache_key!("session", id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use std::sync::Arc;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Visit {
        count: u32,
    }

    fn sessions() -> (Session<Visit>, Cache) {
        let cache = Cache::new(Arc::new(MemoryStore::new()));
        (Session::new(cache.clone()), cache)
    }

    // === SessionId Tests ===

    #[test]
    fn test_session_id_generate_format() {
        let id = SessionId::generate();
        let s = id.as_str();

        assert!(s.starts_with("sess_"));
        // Base64 encoded 18 bytes = 24 chars, plus "sess_" = 29 chars
        assert_eq!(s.len(), 29);
        assert_eq!(SessionId::parse(s), Some(id));
    }

    #[test]
    fn test_session_id_generate_uniqueness() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn test_session_id_parse_rejects() {
        assert!(SessionId::parse("abc").is_none());
        assert!(SessionId::parse("sess_short").is_none());
        assert!(SessionId::parse("sess_<script>alert(1)</script>xx").is_none());
    }

    #[test]
    fn test_session_id_serialization() {
        let id = SessionId::new("serialize-me");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""serialize-me""#);
    }

    // === Session Tests ===

    #[test]
    fn test_get_or_default_does_not_write() {
        let (sessions, _) = sessions();
        let id = SessionId::generate();
        assert_eq!(sessions.get_or_default(&id).unwrap(), Visit::default());
        assert!(!sessions.exists(&id).unwrap());
    }

    #[test]
    fn test_update_increments_version() {
        let (sessions, cache) = sessions();
        let id = SessionId::generate();

        sessions.update(&id, |v| v.count += 1).unwrap();
        let updated = sessions.update(&id, |v| v.count += 1).unwrap();
        assert_eq!(updated.count, 2);

        let stored: SessionData<Visit> = cache.get(&format!("session:{}", id)).unwrap().unwrap();
        assert_eq!(stored.version, 2);
        assert_eq!(stored.data, Visit { count: 2 });
    }

    #[test]
    fn test_ttl_session_expires() {
        let cache = Cache::new(Arc::new(MemoryStore::new()));
        let sessions = Session::<Visit>::new(cache.clone()).with_ttl(Duration::ZERO);
        let id = SessionId::generate();

        sessions.update(&id, |v| v.count += 1).unwrap();
        assert!(!sessions.exists(&id).unwrap());
        assert_eq!(sessions.get_or_default(&id).unwrap(), Visit::default());
    }

    #[test]
    fn test_ttl_sessions_bounded_by_store() {
        let store = Arc::new(MemoryStore::new().with_expiring_capacity(3));
        let sessions = Session::<Visit>::new(Cache::new(store.clone()))
            .with_ttl(Duration::from_secs(60));

        for _ in 0..20 {
            sessions.update(&SessionId::generate(), |v| v.count = 1).unwrap();
        }
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_set_and_delete() {
        let (sessions, _) = sessions();
        let id = SessionId::new("sess_fixed");
        sessions.set(&id, &Visit { count: 7 }).unwrap();
        assert_eq!(sessions.get(&id).unwrap(), Some(Visit { count: 7 }));

        sessions.delete(&id).unwrap();
        assert_eq!(sessions.get(&id).unwrap(), None);
    }
}
