//! # Keel Server
//!
//! HTTP boundary for the Keel service backbone.
//!
//! This crate hosts everything outside the typed pipeline: the hyper
//! listener, the route table, the exception-translating boundary that
//! writes every response and log record, bearer token verification, the
//! redis shared-cache store, and dependency wiring.

#![doc(html_root_url = "https://docs.rs/keel-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod bootstrap;
pub mod boundary;
pub mod claims;
pub mod logging;
pub mod redis_cache;
pub mod routes;
pub mod server;
pub mod state;

pub use state::AppState;
