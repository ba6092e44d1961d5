//! Dependency wiring.
//!
//! Assembles the cache stores, token issuer, probe implementations, and
//! the mediator with every operation registered, producing the state the
//! boundary serves from.

use crate::redis_cache::RedisSharedCache;
use crate::state::AppState;
use keel_config::Settings;
use keel_core::cache::{LocalCache, MemorySharedCache, SharedCache};
use keel_core::pipeline::{CacheStage, Mediator};
use keel_core::TokenIssuer;
use keel_data::{
    MemoryStore, PrimaryStorePingHandler, ReplicaStorePingHandler, StorePing,
};
use keel_service::{login_rules, HealthHandler, LoginHandler};
use std::sync::Arc;

/// Builds process state with the in-memory shared cache.
///
/// Used by tests and storeless deployments; production wiring goes
/// through [`build_state_with_redis`] when a redis url is configured.
#[must_use]
pub fn build_state(settings: Settings) -> AppState {
    build_with_shared(settings, Arc::new(MemorySharedCache::new()))
}

/// Builds process state, connecting to redis when configured.
pub async fn build_state_with_redis(settings: Settings) -> anyhow::Result<AppState> {
    let shared: Arc<dyn SharedCache> = if settings.cache.redis_url.is_empty() {
        Arc::new(MemorySharedCache::new())
    } else {
        Arc::new(
            RedisSharedCache::connect(&settings.cache.redis_url, &settings.cache.instance_name)
                .await?,
        )
    };
    Ok(build_with_shared(settings, shared))
}

fn build_with_shared(settings: Settings, shared: Arc<dyn SharedCache>) -> AppState {
    let settings = Arc::new(settings);

    let caching = CacheStage::new(Arc::new(LocalCache::new()), shared, settings.cache.enabled);
    let mediator = Mediator::new(caching);

    let issuer = Arc::new(TokenIssuer::new(
        settings.auth.jwt_secret.clone(),
        settings.auth.system.clone(),
        settings.auth.token_duration_minutes,
    ));

    // Data boundary: the default wiring ships in-memory probes; a real
    // deployment swaps these for its store clients.
    let primary: Arc<dyn StorePing> = Arc::new(MemoryStore::new());
    let replica: Arc<dyn StorePing> = Arc::new(MemoryStore::new());

    mediator.register(PrimaryStorePingHandler::new(primary));
    mediator.register(ReplicaStorePingHandler::new(replica));
    mediator.register_validated(LoginHandler::new(issuer), login_rules());
    mediator.register(HealthHandler::new(mediator.clone()));

    AppState::new(settings, mediator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_state_registers_all_operations() {
        let state = build_state(Settings::default());
        // Two probes, login, health.
        assert_eq!(state.mediator.registered_count(), 4);
    }

    #[tokio::test]
    async fn redis_less_settings_fall_back_to_memory_store() {
        let state = build_state_with_redis(Settings::default()).await.unwrap();
        assert_eq!(state.mediator.registered_count(), 4);
    }
}
