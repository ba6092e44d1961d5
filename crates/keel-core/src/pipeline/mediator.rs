//! Request dispatcher.
//!
//! The [`Mediator`] routes each typed request to exactly one registered
//! pipeline: validation stage, then caching stage, then the terminal
//! handler. Pipelines are assembled once at registration and resolved by
//! `TypeId` on every send; the stage order never varies per invocation.

use crate::error::Fault;
use crate::pipeline::behavior::{Behavior, Next};
use crate::pipeline::handler::RequestHandler;
use crate::pipeline::request::{CachePayload, Request};
use crate::pipeline::stages::{CacheStage, RuleSet, ValidationStage};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::{Any, TypeId};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The fixed interceptor chain for one request type.
struct Pipeline<R: Request> {
    stages: Vec<Arc<dyn Behavior<R>>>,
    handler: Arc<dyn RequestHandler<R>>,
}

impl<R: Request> Clone for Pipeline<R> {
    fn clone(&self) -> Self {
        Self {
            stages: self.stages.clone(),
            handler: self.handler.clone(),
        }
    }
}

impl<R: Request> Pipeline<R> {
    async fn dispatch(&self, request: R, cancel: &CancellationToken) -> Result<R::Response, Fault> {
        let mut next = Next::handler(self.handler.as_ref());
        for stage in self.stages.iter().rev() {
            next = Next::stage(stage.as_ref(), next);
        }
        next.run(request, cancel).await
    }
}

/// Routes typed requests to their registered pipelines.
///
/// Handlers are registered at bootstrap; a send for an unregistered type
/// is a wiring defect and surfaces as an unclassified fault.
///
/// # Example
///
/// ```
/// use keel_core::cache::{LocalCache, MemorySharedCache};
/// use keel_core::pipeline::{
///     BoxFuture, CacheStage, Mediator, Request, RequestHandler, RuleSet,
/// };
/// use keel_core::Fault;
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// struct Greet;
///
/// impl Request for Greet {
///     type Response = String;
///     const NAME: &'static str = "Greet";
/// }
///
/// struct GreetHandler;
///
/// impl RequestHandler<Greet> for GreetHandler {
///     fn handle<'a>(
///         &'a self,
///         _request: Greet,
///         _cancel: &'a CancellationToken,
///     ) -> BoxFuture<'a, Result<String, Fault>> {
///         Box::pin(async { Ok("hello".to_string()) })
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let caching = CacheStage::new(
///     Arc::new(LocalCache::new()),
///     Arc::new(MemorySharedCache::new()),
///     true,
/// );
/// let mediator = Mediator::new(caching);
/// mediator.register(GreetHandler);
///
/// let cancel = CancellationToken::new();
/// let response = mediator.send(Greet, &cancel).await.unwrap();
/// assert_eq!(response, "hello");
/// # });
/// ```
pub struct Mediator {
    pipelines: DashMap<TypeId, Box<dyn Any + Send + Sync>>,
    caching: CacheStage,
}

impl Mediator {
    /// Creates a dispatcher sharing the given caching stage across all
    /// registered request types.
    #[must_use]
    pub fn new(caching: CacheStage) -> Arc<Self> {
        Arc::new(Self {
            pipelines: DashMap::new(),
            caching,
        })
    }

    /// Registers the terminal handler for `R` with no validation rules.
    pub fn register<R, H>(&self, handler: H)
    where
        R: Request,
        R::Response: Clone + Serialize + DeserializeOwned + CachePayload,
        H: RequestHandler<R>,
    {
        self.register_validated(handler, RuleSet::new());
    }

    /// Registers the terminal handler for `R` together with its rule set.
    ///
    /// The chain is fixed here: validation outermost, then caching, then
    /// the handler. Registering the same request type twice replaces the
    /// earlier pipeline.
    pub fn register_validated<R, H>(&self, handler: H, rules: RuleSet<R>)
    where
        R: Request,
        R::Response: Clone + Serialize + DeserializeOwned + CachePayload,
        H: RequestHandler<R>,
    {
        let stages: Vec<Arc<dyn Behavior<R>>> = vec![
            Arc::new(ValidationStage::new(rules)),
            Arc::new(self.caching.clone()),
        ];
        let pipeline = Pipeline {
            stages,
            handler: Arc::new(handler) as Arc<dyn RequestHandler<R>>,
        };
        self.pipelines
            .insert(TypeId::of::<R>(), Box::new(pipeline));
    }

    /// Dispatches a request through its registered pipeline.
    pub async fn send<R: Request>(
        &self,
        request: R,
        cancel: &CancellationToken,
    ) -> Result<R::Response, Fault> {
        // Clone the (cheap, Arc-backed) pipeline out so no map guard is
        // held across the await below.
        let pipeline = self
            .pipelines
            .get(&TypeId::of::<R>())
            .and_then(|entry| entry.value().downcast_ref::<Pipeline<R>>().cloned())
            .ok_or_else(|| {
                Fault::unclassified(format!("no handler registered for request {}", R::NAME))
            })?;

        pipeline.dispatch(request, cancel).await
    }

    /// Returns the number of registered request types.
    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.pipelines.len()
    }
}
