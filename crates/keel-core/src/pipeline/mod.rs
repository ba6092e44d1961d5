//! Typed request pipeline.
//!
//! Every inbound operation is modeled as a value implementing [`Request`]
//! and dispatched by the [`Mediator`] to exactly one
//! [`RequestHandler`], wrapped in a fixed interceptor chain of
//! [`Behavior`] stages (validation, then caching). Chains are assembled
//! once per request type at registration; per invocation the stages run
//! sequentially on the operation's own task.

mod behavior;
mod handler;
mod mediator;
mod request;
pub mod stages;

pub use behavior::{Behavior, BoxFuture, Next};
pub use handler::RequestHandler;
pub use mediator::Mediator;
pub use request::{CacheMode, CachePayload, CachePolicy, Request};
pub use stages::{CacheStage, Rule, RuleSet, ValidationStage};
