//! # Keel Service
//!
//! Service operations for the Keel backbone: the login operation issuing
//! identity tokens and the health aggregation operation probing the data
//! boundary. Each operation is a typed request with its terminal handler
//! and, where it takes caller input, a structural rule set enforced by the
//! pipeline's validation stage.

#![doc(html_root_url = "https://docs.rs/keel-service/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod auth;
mod health;

pub use auth::{login_rules, LoginHandler, LoginRequest};
pub use health::{render_header, HealthHandler, HealthReport, HealthRequest};
