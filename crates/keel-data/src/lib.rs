//! # Keel Data
//!
//! Data-boundary probe requests for the Keel service backbone.
//!
//! Concrete data access lives behind the [`StorePing`] trait; this crate
//! only defines the seam and the typed probe requests the health
//! aggregator dispatches. Probes are ordinary pipeline requests: they run
//! through the mediator, observe cancellation, and raise faults like any
//! other handler.

#![doc(html_root_url = "https://docs.rs/keel-data/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use keel_core::pipeline::{BoxFuture, Request, RequestHandler};
use keel_core::Fault;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Reachability probe over one backing store.
///
/// Implementations answer `true` when the store accepts a round trip and
/// raise a fault when it cannot be reached; they must observe `cancel`
/// rather than block past it.
pub trait StorePing: Send + Sync + 'static {
    /// Pings the store.
    fn ping<'a>(&'a self, cancel: &'a CancellationToken) -> BoxFuture<'a, Result<bool, Fault>>;
}

/// Probe request against the primary store.
pub struct PrimaryStorePing;

impl Request for PrimaryStorePing {
    type Response = bool;
    const NAME: &'static str = "PrimaryStorePing";
}

/// Probe request against the read-only replica store.
pub struct ReplicaStorePing;

impl Request for ReplicaStorePing {
    type Response = bool;
    const NAME: &'static str = "ReplicaStorePing";
}

/// Handler dispatching [`PrimaryStorePing`] to its store.
pub struct PrimaryStorePingHandler {
    store: Arc<dyn StorePing>,
}

impl PrimaryStorePingHandler {
    /// Wraps the primary store's probe.
    #[must_use]
    pub fn new(store: Arc<dyn StorePing>) -> Self {
        Self { store }
    }
}

impl RequestHandler<PrimaryStorePing> for PrimaryStorePingHandler {
    fn handle<'a>(
        &'a self,
        _request: PrimaryStorePing,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<bool, Fault>> {
        self.store.ping(cancel)
    }
}

/// Handler dispatching [`ReplicaStorePing`] to its store.
pub struct ReplicaStorePingHandler {
    store: Arc<dyn StorePing>,
}

impl ReplicaStorePingHandler {
    /// Wraps the replica store's probe.
    #[must_use]
    pub fn new(store: Arc<dyn StorePing>) -> Self {
        Self { store }
    }
}

impl RequestHandler<ReplicaStorePing> for ReplicaStorePingHandler {
    fn handle<'a>(
        &'a self,
        _request: ReplicaStorePing,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<bool, Fault>> {
        self.store.ping(cancel)
    }
}

/// In-memory store probe for tests and storeless deployments.
///
/// Starts healthy; tests flip it to simulate an unreachable store.
#[derive(Default)]
pub struct MemoryStore {
    down: AtomicBool,
}

impl MemoryStore {
    /// Creates a healthy in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the store up or down.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

impl StorePing for MemoryStore {
    fn ping<'a>(&'a self, cancel: &'a CancellationToken) -> BoxFuture<'a, Result<bool, Fault>> {
        Box::pin(async move {
            if cancel.is_cancelled() {
                return Err(Fault::cancelled());
            }
            if self.down.load(Ordering::SeqCst) {
                return Err(Fault::unclassified("store unreachable"));
            }
            Ok(true)
        })
    }
}
