//! Caching stage.
//!
//! Consults the request's caching policy and either serves a stored
//! response or invokes the rest of the chain and populates the store.
//! No lock is held across the downstream invocation, so concurrent
//! identical-key misses each invoke the handler independently and the
//! last writer wins.

use crate::cache::{derive_key, LocalCache, SharedCache};
use crate::error::Fault;
use crate::pipeline::behavior::{Behavior, BoxFuture, Next};
use crate::pipeline::request::{CacheMode, CachePayload, Request};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Stage wiring the two stores into the request pipeline.
///
/// One instance is shared by every registered request type; the policy on
/// each request value decides per invocation whether and where to cache.
#[derive(Clone)]
pub struct CacheStage {
    local: Arc<LocalCache>,
    shared: Arc<dyn SharedCache>,
    enabled: bool,
}

impl CacheStage {
    /// Builds the stage over the given stores.
    ///
    /// `enabled` is the global configuration switch; when `false` every
    /// request passes straight through regardless of its policy.
    #[must_use]
    pub fn new(local: Arc<LocalCache>, shared: Arc<dyn SharedCache>, enabled: bool) -> Self {
        Self {
            local,
            shared,
            enabled,
        }
    }

    async fn from_local<R>(
        &self,
        key: String,
        ttl: Duration,
        request: R,
        next: Next<'_, R>,
        cancel: &CancellationToken,
    ) -> Result<R::Response, Fault>
    where
        R: Request,
        R::Response: Clone + CachePayload,
    {
        if let Some(hit) = self.local.get::<R::Response>(&key) {
            tracing::debug!(key = %key, "local cache hit");
            return Ok(hit);
        }

        let response = next.run(request, cancel).await?;

        if response.is_absent() {
            return Ok(response);
        }

        self.local.insert(key, response.clone(), ttl);
        Ok(response)
    }

    async fn from_shared<R>(
        &self,
        key: String,
        ttl: Duration,
        request: R,
        next: Next<'_, R>,
        cancel: &CancellationToken,
    ) -> Result<R::Response, Fault>
    where
        R: Request,
        R::Response: Serialize + DeserializeOwned + CachePayload,
    {
        if cancel.is_cancelled() {
            return Err(Fault::cancelled());
        }

        if let Some(bytes) = self
            .shared
            .get(&key)
            .await
            .map_err(|e| Fault::unclassified_from("shared cache read failed", e))?
        {
            tracing::debug!(key = %key, "shared cache hit");
            let decoded = serde_json::from_slice(&bytes)
                .map_err(|e| Fault::unclassified_from("cached payload did not deserialize", e))?;
            return Ok(decoded);
        }

        let response = next.run(request, cancel).await?;

        if response.is_absent() {
            return Ok(response);
        }

        if cancel.is_cancelled() {
            return Err(Fault::cancelled());
        }

        let bytes = serde_json::to_vec(&response)
            .map_err(|e| Fault::unclassified_from("response did not serialize for caching", e))?;
        self.shared
            .set(&key, bytes, ttl)
            .await
            .map_err(|e| Fault::unclassified_from("shared cache write failed", e))?;

        Ok(response)
    }
}

impl<R> Behavior<R> for CacheStage
where
    R: Request,
    R::Response: Clone + Serialize + DeserializeOwned + CachePayload,
{
    fn name(&self) -> &'static str {
        "cache"
    }

    fn handle<'a>(
        &'a self,
        request: R,
        next: Next<'a, R>,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<R::Response, Fault>> {
        Box::pin(async move {
            let Some(policy) = request.cache_policy() else {
                return next.run(request, cancel).await;
            };

            if !self.enabled {
                return next.run(request, cancel).await;
            }

            let key = derive_key(R::NAME, &policy.dimensions);

            match policy.mode {
                CacheMode::None => next.run(request, cancel).await,
                CacheMode::Local => {
                    self.from_local(key, policy.ttl, request, next, cancel).await
                }
                CacheMode::Shared => {
                    self.from_shared(key, policy.ttl, request, next, cancel)
                        .await
                }
            }
        })
    }
}
