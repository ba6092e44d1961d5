//! Shared per-process state.

use keel_config::Settings;
use keel_core::pipeline::Mediator;
use std::sync::Arc;

/// Everything the boundary needs to serve one operation.
#[derive(Clone)]
pub struct AppState {
    /// Loaded service settings.
    pub settings: Arc<Settings>,
    /// The request dispatcher with all operations registered.
    pub mediator: Arc<Mediator>,
}

impl AppState {
    /// Bundles settings and the dispatcher.
    #[must_use]
    pub fn new(settings: Arc<Settings>, mediator: Arc<Mediator>) -> Self {
        Self { settings, mediator }
    }

    /// Returns the version stamped into every envelope.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.settings.service.version
    }
}
