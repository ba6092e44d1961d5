//! In-process cache store.
//!
//! Holds typed responses directly (no serialization) with an absolute
//! expiry instant per entry. Entries are never invalidated explicitly;
//! staleness is bounded only by the ttl a request's policy declares.

use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One stored value with its absolute expiry.
struct LocalEntry {
    value: Arc<dyn Any + Send + Sync>,
    expires_at: Instant,
}

impl LocalEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Shared in-process store keyed by derived cache keys.
///
/// Reads and writes are lock-free per shard; no lock is ever held across
/// an await point, so concurrent identical-key misses race and the last
/// writer wins.
#[derive(Default)]
pub struct LocalCache {
    entries: DashMap<String, LocalEntry>,
}

impl LocalCache {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a clone of the stored value for `key` if present, typed
    /// correctly, and not yet expired. Expired entries are removed.
    #[must_use]
    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Option<T> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_expired() => true,
            Some(entry) => return entry.value.downcast_ref::<T>().cloned(),
            None => return None,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    /// Stores `value` under `key`, expiring `ttl` from now. Replaces any
    /// existing entry.
    pub fn insert<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T, ttl: Duration) {
        self.entries.insert(
            key.into(),
            LocalEntry {
                value: Arc::new(value),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Returns the number of live and expired entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_on_empty_store() {
        let cache = LocalCache::new();
        assert_eq!(cache.get::<String>("missing"), None);
    }

    #[test]
    fn hit_returns_stored_value() {
        let cache = LocalCache::new();
        cache.insert("k", "value".to_string(), Duration::from_secs(60));
        assert_eq!(cache.get::<String>("k"), Some("value".to_string()));
    }

    #[test]
    fn expired_entry_is_a_miss_and_removed() {
        let cache = LocalCache::new();
        cache.insert("k", 7_u32, Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get::<u32>("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn wrong_type_is_a_miss() {
        let cache = LocalCache::new();
        cache.insert("k", 7_u32, Duration::from_secs(60));
        assert_eq!(cache.get::<String>("k"), None);
    }

    #[test]
    fn insert_replaces_existing_entry() {
        let cache = LocalCache::new();
        cache.insert("k", 1_u32, Duration::from_secs(60));
        cache.insert("k", 2_u32, Duration::from_secs(60));
        assert_eq!(cache.get::<u32>("k"), Some(2));
        assert_eq!(cache.len(), 1);
    }
}
