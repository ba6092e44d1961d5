//! Layered settings loader.
//!
//! Settings are applied in layers, later layers overriding earlier ones:
//! defaults built into the types, then a TOML file, then environment
//! variables of the form `PREFIX__SECTION__KEY`.

use crate::{ConfigError, Settings};
use std::env;
use std::fs;
use std::path::Path;

/// Layered loader for [`Settings`].
///
/// # Example
///
/// ```no_run
/// use keel_config::SettingsLoader;
///
/// # fn main() -> Result<(), keel_config::ConfigError> {
/// let settings = SettingsLoader::new()
///     .with_optional_file("keel.toml")?
///     .with_env_prefix("KEEL")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct SettingsLoader {
    settings: Settings,
    env_prefix: Option<String>,
}

impl SettingsLoader {
    /// Creates a loader starting from default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and merges a TOML file; the file must exist.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;
        self.settings = toml::from_str(&content)?;
        Ok(self)
    }

    /// Loads a TOML file when present, silently continuing otherwise.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Parses settings from a TOML string.
    pub fn with_string(mut self, content: &str) -> Result<Self, ConfigError> {
        self.settings = toml::from_str(content)?;
        Ok(self)
    }

    /// Loads a `.env` file into the process environment when one exists.
    ///
    /// Call before [`with_env_prefix`](Self::with_env_prefix) so the file's
    /// variables participate in the override layer.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        dotenvy::dotenv().ok();
        self
    }

    /// Enables environment overrides with the given prefix.
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`, for example
    /// `KEEL__CACHE__REDIS_URL=redis://cache:6379`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Finalizes the layered settings.
    pub fn load(mut self) -> Result<Settings, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let marker = format!("{prefix}__");
            for (key, value) in env::vars() {
                if key.starts_with(&marker) {
                    self.apply_env_var(&key, &value, &prefix)?;
                }
            }
        }
        Ok(self.settings)
    }

    /// Applies one environment override.
    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let path = key
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix("__"))
            .unwrap_or_default()
            .to_lowercase();

        match path.as_str() {
            "service__name" => self.settings.service.name = value.to_string(),
            "service__version" => self.settings.service.version = value.to_string(),
            "server__bind_addr" => self.settings.server.bind_addr = value.to_string(),
            "cache__enabled" => {
                self.settings.cache.enabled = parse_bool(key, value)?;
            }
            "cache__redis_url" => self.settings.cache.redis_url = value.to_string(),
            "cache__instance_name" => self.settings.cache.instance_name = value.to_string(),
            "localization__header_name" => {
                self.settings.localization.header_name = value.to_string();
            }
            "localization__default_culture" => {
                self.settings.localization.default_culture = value.to_string();
            }
            "auth__system" => self.settings.auth.system = value.to_string(),
            "auth__jwt_secret" => self.settings.auth.jwt_secret = value.to_string(),
            "auth__token_duration_minutes" => {
                self.settings.auth.token_duration_minutes = value.parse().map_err(|_| {
                    ConfigError::env_override(key, "expected an integer number of minutes")
                })?;
            }
            "log__level" => self.settings.log.level = value.to_string(),
            "log__json" => self.settings.log.json = parse_bool(key, value)?,
            "log__requests" => self.settings.log.requests = parse_bool(key, value)?,
            // Unknown keys under the prefix are ignored so unrelated
            // variables sharing it cannot break startup.
            _ => {}
        }
        Ok(())
    }
}

fn parse_bool(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::env_override(var, "expected a boolean")),
    }
}
