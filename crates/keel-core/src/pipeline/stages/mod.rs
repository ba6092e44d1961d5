//! Pipeline stages.
//!
//! The interceptor chain for every request type is fixed at registration:
//!
//! ```text
//! Request → Validation → Cache → Handler
//! ```
//!
//! [`ValidationStage`] rejects structurally invalid requests before any
//! business logic runs; [`CacheStage`] decides per request whether to
//! serve from a store or invoke downstream and populate it.

pub mod cache;
pub mod validation;

pub use cache::CacheStage;
pub use validation::{Rule, RuleSet, ValidationStage};
