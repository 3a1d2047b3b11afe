//! Configuration management for the schema cache
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schema-cache.toml)
//! - Environment variables (SCHEMA_CACHE__*)
//!
//! ## Example config file (schema-cache.toml):
//! ```toml
//! [registry]
//! url = "http://localhost:8081"
//! username = "reader"
//! password = "secret"
//! timeout_secs = 10
//!
//! [cache]
//! preload = ["orders-value", "users-value"]
//! format = "json_schema"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::strategy::SchemaFormat;

/// Main configuration for the schema cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Registry connection settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Cache behaviour
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Registry connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base URL of the schema registry
    #[serde(default = "default_registry_url")]
    pub url: String,

    /// Basic auth user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Basic auth password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Cache behaviour
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Subjects loaded eagerly at startup
    #[serde(default)]
    pub preload: Vec<String>,

    /// Schema format used when resolving compatible versions
    #[serde(default)]
    pub format: SchemaFormat,
}

// Default value functions
fn default_registry_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
            username: None,
            password: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CacheConfig {
    /// Load configuration, adding a specific file on top of the default locations
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = [
            "schema-cache.toml",
            ".schema-cache.toml",
            "config/schema-cache.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "schema-cache") {
            let xdg_config = config_dir.config_dir().join("schema-cache.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (SCHEMA_CACHE__*)
        builder = builder.add_source(
            Environment::with_prefix("SCHEMA_CACHE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("cache.preload"),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.registry.url, "http://localhost:8081");
        assert_eq!(config.registry.timeout_secs, 10);
        assert!(config.cache.preload.is_empty());
        assert_eq!(config.cache.format, SchemaFormat::JsonSchema);
    }

    #[test]
    fn test_serialize_config() {
        let config = CacheConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[registry]"));
        assert!(toml_str.contains("[cache]"));
        assert!(!toml_str.contains("password"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.toml");
        std::fs::write(
            &path,
            r#"
[registry]
url = "https://registry.internal:8081"
username = "reader"
password = "secret"

[cache]
preload = ["orders-value", "users-value"]
format = "avro"
"#,
        )
        .unwrap();

        let config = CacheConfig::load_from(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.registry.url, "https://registry.internal:8081");
        assert_eq!(config.registry.username.as_deref(), Some("reader"));
        assert_eq!(config.registry.timeout_secs, 10);
        assert_eq!(config.cache.preload, vec!["orders-value", "users-value"]);
        assert_eq!(config.cache.format, SchemaFormat::Avro);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");

        let mut config = CacheConfig::default();
        config.cache.preload = vec!["orders-value".to_string()];
        config.save(path.to_str().unwrap()).unwrap();

        let loaded = CacheConfig::load_from(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(loaded.cache.preload, vec!["orders-value"]);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(CacheConfig::load_from(Some(path.to_str().unwrap())).is_err());
    }
}
