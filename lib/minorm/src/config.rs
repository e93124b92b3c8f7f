//! Connection pool configuration.
//!
//! [`PoolConfig`] carries everything a backend needs to open its pool. It can
//! be built in code, or loaded from JSON with a defaults layer and an
//! optional override layer on top (see [`merge`]).

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;
use tracing::debug;

use crate::OrmError;

/// Settings for a backend connection pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Hostname or IP address (default: localhost)
    pub host: String,
    /// Port number (default: 3306)
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Database name to connect to
    pub database: String,
    /// Character set (default: utf8)
    pub charset: String,
    /// Autocommit mode of pooled connections (default: true)
    pub autocommit: bool,
    /// Connections kept open while idle (default: 1)
    pub minsize: u32,
    /// Upper bound on open connections (default: 10)
    pub maxsize: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: String::new(),
            password: String::new(),
            database: String::new(),
            charset: "utf8".to_string(),
            autocommit: true,
            minsize: 1,
            maxsize: 10,
        }
    }
}

impl PoolConfig {
    pub fn new(
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            user: user.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    pub fn autocommit(mut self, autocommit: bool) -> Self {
        self.autocommit = autocommit;
        self
    }

    /// Set the pool bounds.
    pub fn pool_size(mut self, minsize: u32, maxsize: u32) -> Self {
        self.minsize = minsize;
        self.maxsize = maxsize;
        self
    }

    /// Check the pool bounds.
    pub fn validate(&self) -> Result<(), OrmError> {
        if self.maxsize == 0 {
            return Err(OrmError::Config("maxsize must be at least 1".to_string()));
        }
        if self.minsize > self.maxsize {
            return Err(OrmError::Config(format!(
                "minsize ({}) exceeds maxsize ({})",
                self.minsize, self.maxsize
            )));
        }
        Ok(())
    }

    /// Parse a JSON object. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, OrmError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a defaults file and overlay an optional override file.
    ///
    /// A missing override file is skipped.
    pub fn load_layered(defaults: &Path, overrides: Option<&Path>) -> Result<Self, OrmError> {
        let base: JsonValue = serde_json::from_str(&std::fs::read_to_string(defaults)?)?;
        let merged = match overrides {
            Some(path) if path.exists() => {
                let layer: JsonValue = serde_json::from_str(&std::fs::read_to_string(path)?)?;
                merge(&base, &layer)
            }
            Some(path) => {
                debug!(path = %path.display(), "no override config");
                base
            }
            None => base,
        };
        let config: Self = serde_json::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }
}

/// Overlay `overrides` onto `defaults`.
///
/// Only keys present in `defaults` are kept. Nested objects merge
/// recursively, any other value is replaced wholesale.
pub fn merge(defaults: &JsonValue, overrides: &JsonValue) -> JsonValue {
    match (defaults, overrides) {
        (JsonValue::Object(base), JsonValue::Object(layer)) => {
            let merged = base
                .iter()
                .map(|(key, value)| {
                    let value = match layer.get(key) {
                        Some(over) if value.is_object() => merge(value, over),
                        Some(over) => over.clone(),
                        None => value.clone(),
                    };
                    (key.clone(), value)
                })
                .collect();
            JsonValue::Object(merged)
        }
        _ => defaults.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_create_pool_signature() {
        let config = PoolConfig::new("awesome", "www-data", "www-data");
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 3306);
        assert_eq!(config.charset, "utf8");
        assert!(config.autocommit);
        assert_eq!((config.minsize, config.maxsize), (1, 10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_bounds() {
        let config = PoolConfig::default().pool_size(5, 2);
        assert!(matches!(config.validate(), Err(OrmError::Config(_))));

        let config = PoolConfig::default().pool_size(0, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config =
            PoolConfig::from_json_str(r#"{"database": "awesome", "port": 3307}"#).unwrap();
        assert_eq!(config.database, "awesome");
        assert_eq!(config.port, 3307);
        assert_eq!(config.host, "localhost");
    }

    #[test]
    fn merge_keeps_only_default_keys() {
        let defaults = json!({
            "debug": true,
            "db": {"host": "127.0.0.1", "port": 3306, "user": "www-data"},
            "session": {"secret": "Awesome"}
        });
        let overrides = json!({
            "db": {"host": "192.168.0.100"},
            "unknown": 1
        });

        let merged = merge(&defaults, &overrides);
        assert_eq!(merged["db"]["host"], "192.168.0.100");
        assert_eq!(merged["db"]["port"], 3306);
        assert_eq!(merged["session"]["secret"], "Awesome");
        assert!(merged.get("unknown").is_none());
    }

    #[test]
    fn load_layered_skips_missing_override() {
        let dir = std::env::temp_dir().join(format!("minorm-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let defaults = dir.join("defaults.json");
        std::fs::write(&defaults, r#"{"database": "awesome", "user": "www-data"}"#).unwrap();

        let config = PoolConfig::load_layered(&defaults, Some(&dir.join("missing.json"))).unwrap();
        assert_eq!(config.database, "awesome");

        let overrides = dir.join("override.json");
        std::fs::write(&overrides, r#"{"database": "prod"}"#).unwrap();
        let config = PoolConfig::load_layered(&defaults, Some(&overrides)).unwrap();
        assert_eq!(config.database, "prod");
        assert_eq!(config.user, "www-data");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
