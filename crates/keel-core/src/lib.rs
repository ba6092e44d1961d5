//! # Keel Core
//!
//! Core request pipeline for the Keel service backbone.
//!
//! Every inbound operation is a typed [`Request`](pipeline::Request) value
//! dispatched by the [`Mediator`](pipeline::Mediator) through a fixed
//! interceptor chain (validation, then caching, then the terminal
//! handler) so cross-cutting concerns live in one place instead of in
//! every handler.
//!
//! This crate provides:
//!
//! - [`pipeline`] - the mediator, behavior chain, and its two stages
//! - [`cache`] - local and shared cache stores plus key derivation
//! - [`context`] - lazy, independently-failing carrier accessors
//! - [`Fault`] / [`ErrorKind`] - the closed fault taxonomy
//! - [`envelope`] - wire-level success and error envelopes
//! - [`LogDetail`] - the per-operation structured log record
//! - [`token`] - identity token issuing

#![doc(html_root_url = "https://docs.rs/keel-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cache;
mod context;
mod envelope;
mod error;
mod log;
pub mod pipeline;
pub mod token;

pub use context::{AppContext, Claims, ContextError, CLIENT_IP_HEADER, FORWARDED_FOR_HEADER};
pub use envelope::{ApiError, ApiResponse};
pub use error::{ErrorKind, Fault, FaultResult, FieldErrors};
pub use log::LogDetail;
pub use token::{TokenGrant, TokenIssuer};
