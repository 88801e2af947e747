//! TOML-based application configuration.
//!
//! Holds machine-local preferences only:
//! - which store backend to talk to (and how to reach it)
//! - clock tick interval
//! - how far back session history is cached for streaks
//! - log filter
//!
//! Timer durations and sound toggles are *not* here; they belong to the
//! user's [`TimerSettings`](crate::settings::TimerSettings) in the store.
//!
//! Configuration is stored at `~/.config/focusroom/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Http,
    Memory,
}

/// Store backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Base URL of the tracker API (http backend only).
    #[serde(default)]
    pub api_url: Option<String>,
    /// Environment variable holding the API bearer token.
    #[serde(default = "default_api_token_env")]
    pub api_token_env: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Clock configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Session statistics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default = "default_streak_lookback_days")]
    pub streak_lookback_days: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/focusroom/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub stats: StatsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_api_token_env() -> String {
    "FOCUSROOM_API_TOKEN".into()
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_streak_lookback_days() -> u32 {
    60
}
fn default_log_filter() -> String {
    "info".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            api_url: None,
            api_token_env: default_api_token_env(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            streak_lookback_days: default_streak_lookback_days(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl ClockConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

impl AppConfig {
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Load, falling back to defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default configuration");
            Self::default()
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a value by dot-separated key, e.g. `store.backend`.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let value = key
            .split('.')
            .try_fold(&json, |node, part| node.get(part))?;
        match value {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => Some(String::new()),
            other => Some(other.to_string()),
        }
    }

    /// Every leaf setting as a `(section.key, value)` pair, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        let Ok(serde_json::Value::Object(sections)) = serde_json::to_value(self) else {
            return Vec::new();
        };
        let mut entries = Vec::new();
        for (section, fields) in &sections {
            let Some(fields) = fields.as_object() else {
                continue;
            };
            for field in fields.keys() {
                let key = format!("{section}.{field}");
                if let Some(value) = self.get(&key) {
                    entries.push((key, value));
                }
            }
        }
        entries
    }

    /// Set a value by dot-separated key. The new value takes the type of the
    /// existing one; optional strings accept any text (empty clears them).
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        let (parent_path, leaf) = key.rsplit_once('.').unwrap_or(("", key));
        let parent = if parent_path.is_empty() {
            Some(&mut json)
        } else {
            parent_path
                .split('.')
                .try_fold(&mut json, |node, part| node.get_mut(part))
        };
        let slot = parent
            .and_then(|p| p.as_object_mut())
            .and_then(|obj| obj.get_mut(leaf))
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        *slot = match &*slot {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => serde_json::Value::Number(
                value.parse::<u64>().map_err(|e| invalid(e.to_string()))?.into(),
            ),
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                return Err(invalid("not a leaf value".into()))
            }
            serde_json::Value::Null if value.is_empty() => serde_json::Value::Null,
            _ if value.is_empty() && leaf == "api_url" => serde_json::Value::Null,
            _ => serde_json::Value::String(value.to_string()),
        };

        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_flatten_every_section() {
        let mut cfg = AppConfig::default();
        cfg.set("store.backend", "http").unwrap();
        let entries = cfg.entries();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert!(keys.contains(&"clock.tick_interval_ms"));
        assert!(keys.contains(&"logging.filter"));
        assert!(keys.contains(&"stats.streak_lookback_days"));
        assert!(entries.contains(&("store.backend".to_string(), "http".to_string())));
        assert!(entries.contains(&("store.api_url".to_string(), String::new())));
    }

    #[test]
    fn default_config_roundtrip() {
        let cfg = AppConfig::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.store.backend, StoreBackend::Sqlite);
        assert_eq!(parsed.clock.tick_interval_ms, 1000);
        assert_eq!(parsed.stats.streak_lookback_days, 60);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [store]
            backend = "http"
            api_url = "https://tracker.example/api"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.store.backend, StoreBackend::Http);
        assert_eq!(cfg.store.api_token_env, "FOCUSROOM_API_TOKEN");
        assert_eq!(cfg.logging.filter, "info");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.get("store.backend").as_deref(), Some("sqlite"));
        assert_eq!(cfg.get("clock.tick_interval_ms").as_deref(), Some("1000"));
        assert_eq!(cfg.get("store.api_url").as_deref(), Some(""));
        assert!(cfg.get("store.missing").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = AppConfig::default();
        cfg.set("store.backend", "memory").unwrap();
        cfg.set("clock.tick_interval_ms", "250").unwrap();
        cfg.set("store.api_url", "http://localhost:8000").unwrap();
        assert_eq!(cfg.store.backend, StoreBackend::Memory);
        assert_eq!(cfg.clock.tick_interval(), Duration::from_millis(250));
        assert_eq!(cfg.store.api_url.as_deref(), Some("http://localhost:8000"));

        cfg.set("store.api_url", "").unwrap();
        assert!(cfg.store.api_url.is_none());
    }

    #[test]
    fn set_rejects_unknown_keys_and_bad_values() {
        let mut cfg = AppConfig::default();
        assert!(matches!(
            cfg.set("store.nope", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(cfg.set("clock.tick_interval_ms", "fast").is_err());
        assert!(cfg.set("store.backend", "carrier-pigeon").is_err());
        assert!(cfg.set("store", "x").is_err());
        assert_eq!(cfg.store.backend, StoreBackend::Sqlite);
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg.store.backend, StoreBackend::Sqlite);
        assert!(path.exists());
    }
}
