//! # Keel Config
//!
//! Typed configuration for the Keel service backbone.
//!
//! Settings load in layers: type-level defaults, then an optional TOML
//! file, then `KEEL__SECTION__KEY` environment overrides. A `.env` file is
//! honored when present via `dotenvy` at bootstrap.

#![doc(html_root_url = "https://docs.rs/keel-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod loader;
mod settings;

pub use error::ConfigError;
pub use loader::SettingsLoader;
pub use settings::{
    AuthSettings, CacheSettings, LocalizationSettings, LogSettings, ServerSettings,
    ServiceSettings, Settings,
};
