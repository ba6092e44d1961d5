//! Typed settings.
//!
//! Settings are grouped by concern; every section has serde defaults so a
//! partial configuration file is valid and an empty one yields a runnable
//! development setup.

use serde::{Deserialize, Serialize};

/// Root settings for a Keel service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Settings {
    /// Service identity.
    pub service: ServiceSettings,
    /// HTTP listener.
    pub server: ServerSettings,
    /// Caching switches and backend.
    pub cache: CacheSettings,
    /// Locale header configuration.
    pub localization: LocalizationSettings,
    /// Identity token configuration.
    pub auth: AuthSettings,
    /// Logging configuration.
    pub log: LogSettings,
}

/// Service identity reported in every response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServiceSettings {
    /// Human-readable service name.
    pub name: String,
    /// Version string stamped into envelopes.
    pub version: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "keel".to_string(),
            version: "1.0.0".to_string(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServerSettings {
    /// Address the listener binds, `host:port`.
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Caching switches and backend location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CacheSettings {
    /// Global switch; `false` bypasses all caching regardless of policy.
    pub enabled: bool,
    /// Redis connection string for the shared store; empty selects the
    /// in-memory store.
    pub redis_url: String,
    /// Prefix namespacing this deployment's keys in the shared store.
    pub instance_name: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            redis_url: String::new(),
            instance_name: "keel".to_string(),
        }
    }
}

/// Locale header configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LocalizationSettings {
    /// Header carrying the caller's locale.
    pub header_name: String,
    /// Locale assumed when the header is absent.
    pub default_culture: String,
    /// Locales the service accepts.
    pub supported_cultures: Vec<String>,
}

impl Default for LocalizationSettings {
    fn default() -> Self {
        Self {
            header_name: "accept-language".to_string(),
            default_culture: "en-US".to_string(),
            supported_cultures: vec!["en-US".to_string()],
        }
    }
}

/// Identity token configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AuthSettings {
    /// System tag stamped into and expected from token claims.
    pub system: String,
    /// HMAC signing secret.
    pub jwt_secret: String,
    /// Token validity in minutes.
    pub token_duration_minutes: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            system: "keel".to_string(),
            jwt_secret: String::new(),
            token_duration_minutes: 60,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LogSettings {
    /// Log level filter, e.g. `info` or `keel_server=debug`.
    pub level: String,
    /// Emit JSON records instead of human-readable lines.
    pub json: bool,
    /// Emit one record per successful operation, not just faults.
    pub requests: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
            requests: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_runnable() {
        let settings = Settings::default();
        assert_eq!(settings.service.name, "keel");
        assert!(settings.cache.enabled);
        assert!(settings.cache.redis_url.is_empty());
        assert_eq!(settings.localization.header_name, "accept-language");
        assert_eq!(settings.auth.token_duration_minutes, 60);
    }

    #[test]
    fn empty_toml_parses_to_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [auth]
            system = "orders"
            "#,
        )
        .unwrap();
        assert_eq!(settings.auth.system, "orders");
        assert_eq!(settings.auth.token_duration_minutes, 60);
        assert_eq!(settings.service.name, "keel");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<Settings, _> = toml::from_str(
            r#"
            [service]
            nmae = "typo"
            "#,
        );
        assert!(result.is_err());
    }
}
