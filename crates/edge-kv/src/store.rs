//! Key-value storage capability.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::CacheError;

/// Byte-oriented key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Get the value for a key.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Set the value for a key, replacing any existing value.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError>;

    /// Set a value that may be dropped once `ttl` has passed. Stores
    /// without expiry keep it like `set`.
    fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let _ = ttl;
        self.set(key, value)
    }

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Check whether a key exists.
    fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get(key)?.is_some())
    }

    /// List keys starting with `prefix`.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, CacheError>;
}

#[derive(Debug)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// In-process store backed by a concurrent map.
///
/// Entries written with a TTL are swept on every new-key write and, when
/// a capacity is set, the soonest-expiring ones are evicted to make room.
/// Entries written without a TTL are never evicted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
    max_expiring: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of entries held with a TTL.
    pub fn with_expiring_capacity(mut self, max: usize) -> Self {
        self.max_expiring = Some(max.max(1));
        self
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn make_room(&self, now: Instant) {
        self.entries.retain(|_, entry| entry.is_live(now));

        let Some(max) = self.max_expiring else {
            return;
        };
        loop {
            let mut expiring = 0;
            let mut oldest: Option<(String, Instant)> = None;
            for entry in self.entries.iter() {
                if let Some(at) = entry.value().expires_at {
                    expiring += 1;
                    if oldest.as_ref().map_or(true, |(_, o)| at < *o) {
                        oldest = Some((entry.key().clone(), at));
                    }
                }
            }
            match oldest {
                Some((key, _)) if expiring >= max => {
                    self.entries.remove(&key);
                }
                _ => break,
            }
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();
        Ok(self
            .entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value().value.clone()))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at: None,
            },
        );
        Ok(())
    }

    fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        if !self.entries.contains_key(key) {
            self.make_room(now);
        }
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at: Some(now + ttl),
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get(key)?.is_some())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.key().starts_with(prefix) && e.value().is_live(now))
            .map(|e| e.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}
