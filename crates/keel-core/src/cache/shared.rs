//! Shared (external) cache store boundary.
//!
//! The shared store operates on serialized byte payloads with a ttl; the
//! concrete backend (redis in production, in-memory in tests) lives behind
//! the [`SharedCache`] trait. Store failures surface as [`CacheError`] and
//! propagate like any other fault; nothing here retries.

use crate::pipeline::BoxFuture;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Failure talking to the shared store.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend rejected or failed the operation.
    #[error("shared cache backend error: {0}")]
    Backend(#[source] anyhow::Error),
}

/// Key-value store with ttl semantics over serialized payloads.
///
/// Implementations must not hold internal locks across their own I/O; the
/// caching behavior never serializes access, so concurrent identical-key
/// writes are expected and last-writer-wins.
pub trait SharedCache: Send + Sync + 'static {
    /// Fetches the payload stored under `key`, if any.
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Vec<u8>>, CacheError>>;

    /// Stores `value` under `key`, expiring `ttl` from now.
    fn set<'a>(
        &'a self,
        key: &'a str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> BoxFuture<'a, Result<(), CacheError>>;
}

/// In-memory [`SharedCache`] used by tests and single-node deployments.
#[derive(Default)]
pub struct MemorySharedCache {
    entries: DashMap<String, (Vec<u8>, Instant)>,
}

impl MemorySharedCache {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SharedCache for MemorySharedCache {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Vec<u8>>, CacheError>> {
        Box::pin(async move {
            let expired = match self.entries.get(key) {
                Some(entry) if Instant::now() >= entry.1 => true,
                Some(entry) => return Ok(Some(entry.0.clone())),
                None => return Ok(None),
            };
            if expired {
                self.entries.remove(key);
            }
            Ok(None)
        })
    }

    fn set<'a>(
        &'a self,
        key: &'a str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> BoxFuture<'a, Result<(), CacheError>> {
        Box::pin(async move {
            self.entries
                .insert(key.to_string(), (value, Instant::now() + ttl));
            Ok(())
        })
    }
}
