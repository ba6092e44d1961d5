//! Typed request values and their caching policies.

use std::time::Duration;

/// A typed, immutable value representing one operation.
///
/// The declared [`NAME`](Request::NAME) is the request's identity for
/// dispatch and for cache-key derivation, so it must be unique across the
/// service and stable across releases that share a cache.
///
/// # Example
///
/// ```
/// use keel_core::pipeline::{CacheMode, CachePolicy, Request};
/// use std::time::Duration;
///
/// struct AccountSummary {
///     account_id: u64,
/// }
///
/// impl Request for AccountSummary {
///     type Response = String;
///     const NAME: &'static str = "AccountSummary";
///
///     fn cache_policy(&self) -> Option<CachePolicy> {
///         Some(CachePolicy::new(
///             CacheMode::Local,
///             vec![self.account_id.to_string()],
///             Duration::from_secs(30),
///         ))
///     }
/// }
/// ```
pub trait Request: Send + Sync + 'static {
    /// The response produced by this request's terminal handler.
    type Response: Send + Sync + 'static;

    /// Declared type name used for dispatch identity and cache keys.
    const NAME: &'static str;

    /// The caching policy for this request value, if any.
    ///
    /// Returning `None` (the default) bypasses the caching behavior
    /// entirely for this request.
    fn cache_policy(&self) -> Option<CachePolicy> {
        None
    }
}

/// Where a cached response lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Caching declared but switched off for this request.
    None,
    /// In-process store holding the typed response.
    Local,
    /// External store holding the serialized response.
    Shared,
}

/// Caching policy attached to a request value.
///
/// `dimensions` must be sufficient to disambiguate all distinct responses
/// for the request type; a key collision across logically different
/// requests is a correctness bug, not a performance one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// Store selection.
    pub mode: CacheMode,
    /// Ordered opaque values contributing to the cache key.
    pub dimensions: Vec<String>,
    /// Absolute-from-now expiry for populated entries.
    pub ttl: Duration,
}

impl CachePolicy {
    /// Builds a policy.
    #[must_use]
    pub fn new(mode: CacheMode, dimensions: Vec<String>, ttl: Duration) -> Self {
        Self {
            mode,
            dimensions,
            ttl,
        }
    }
}

/// Lets a response declare itself absent.
///
/// Absent results are returned to the caller but never cached, so the next
/// identical request re-invokes the handler instead of serving a cached
/// absence. Concrete response types usually take the default; `Option`
/// responses report `None` as absent.
pub trait CachePayload {
    /// Returns `true` when this result must not be cached.
    fn is_absent(&self) -> bool {
        false
    }
}

impl<T> CachePayload for Option<T> {
    fn is_absent(&self) -> bool {
        self.is_none()
    }
}

impl CachePayload for bool {}
impl CachePayload for String {}
impl CachePayload for () {}
