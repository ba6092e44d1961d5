//! Redis-backed shared cache store.
//!
//! Keys are namespaced with the configured instance name so multiple
//! deployments can share one backend. Payloads are opaque bytes; ttl maps
//! to the key's expiry. Connection management is delegated to the redis
//! crate's multiplexed manager, which reconnects on its own.

use keel_core::cache::{CacheError, SharedCache};
use keel_core::pipeline::BoxFuture;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

/// [`SharedCache`] implementation over redis.
pub struct RedisSharedCache {
    manager: ConnectionManager,
    prefix: String,
}

impl RedisSharedCache {
    /// Connects to the backend at `url` and namespaces keys with
    /// `instance_name`.
    pub async fn connect(url: &str, instance_name: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheError::Backend(anyhow::Error::new(e)))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Backend(anyhow::Error::new(e)))?;
        Ok(Self {
            manager,
            prefix: format!("{instance_name}:"),
        })
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

impl SharedCache for RedisSharedCache {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Vec<u8>>, CacheError>> {
        Box::pin(async move {
            let mut conn = self.manager.clone();
            conn.get::<_, Option<Vec<u8>>>(self.namespaced(key))
                .await
                .map_err(|e| CacheError::Backend(anyhow::Error::new(e)))
        })
    }

    fn set<'a>(
        &'a self,
        key: &'a str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> BoxFuture<'a, Result<(), CacheError>> {
        Box::pin(async move {
            let mut conn = self.manager.clone();
            conn.set_ex::<_, _, ()>(self.namespaced(key), value, ttl.as_secs().max(1))
                .await
                .map_err(|e| CacheError::Backend(anyhow::Error::new(e)))
        })
    }
}
