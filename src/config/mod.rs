//! TOML configuration with serde defaults.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

/// Environment variable overriding the configured encryption key.
pub const ENCRYPTION_KEY_ENV: &str = "HUBDECK_ENCRYPTION_KEY";

/// Complete hubdeck configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HubdeckConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Public base URL used to build OAuth redirect URIs; must match the
    /// URIs registered with the providers exactly
    #[serde(default = "default_base_url")]
    pub callback_base_url: String,
    /// Where OAuth callbacks send the browser afterwards
    #[serde(default = "default_ui_redirect_url")]
    pub ui_redirect_url: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8686".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8686".to_string()
}

fn default_ui_redirect_url() -> String {
    "http://localhost:8686/settings".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            callback_base_url: default_base_url(),
            ui_redirect_url: default_ui_redirect_url(),
        }
    }
}

/// Settings database and encryption key configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite settings database
    #[serde(default = "default_settings_db")]
    pub settings_db: String,
    /// Key for secrets at rest; 64-char hex preferred, any non-empty string
    /// accepted. There is deliberately no default: the process refuses to
    /// start without one.
    #[serde(default)]
    pub encryption_key: String,
}

fn default_settings_db() -> String {
    "hubdeck.db".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            settings_db: default_settings_db(),
            encryption_key: String::new(),
        }
    }
}

impl StorageConfig {
    /// Resolve the encryption key, preferring the environment variable over
    /// the config file. Fails when neither is set.
    pub fn resolve_encryption_key(&self) -> Result<String> {
        let key = std::env::var(ENCRYPTION_KEY_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.encryption_key.clone());

        if key.trim().is_empty() {
            return Err(anyhow!(
                "no encryption key configured: set [storage].encryption_key or {}",
                ENCRYPTION_KEY_ENV
            ));
        }
        Ok(key)
    }
}

/// Result cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Freshness window for cached provider results (seconds)
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

fn default_ttl_seconds() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

/// Load configuration from a TOML file; a missing file yields defaults so a
/// bare deployment can run entirely from environment variables.
pub fn load_config(path: &str) -> Result<HubdeckConfig> {
    if !std::path::Path::new(path).exists() {
        return Ok(HubdeckConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {path}"))?;
    let config: HubdeckConfig =
        toml::from_str(&contents).with_context(|| format!("Failed to parse {path}"))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HubdeckConfig::default();
        assert_eq!(config.server.bind_addr, "127.0.0.1:8686");
        assert_eq!(config.cache.ttl_seconds, 300);
        assert!(config.storage.encryption_key.is_empty());
    }

    #[test]
    fn test_config_deserialization() {
        let toml = r#"
            [server]
            bind_addr = "0.0.0.0:9000"
            callback_base_url = "https://desk.example.com"
            ui_redirect_url = "https://desk.example.com/settings"

            [storage]
            settings_db = "/var/lib/hubdeck/settings.db"
            encryption_key = "deadbeef"

            [cache]
            ttl_seconds = 120
        "#;

        let config: HubdeckConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.storage.settings_db, "/var/lib/hubdeck/settings.db");
        assert_eq!(config.cache.ttl_seconds, 120);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
            [cache]
            ttl_seconds = 60
        "#;

        let config: HubdeckConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.cache.ttl_seconds, 60);
        assert_eq!(config.server.bind_addr, "127.0.0.1:8686"); // Default
    }

    #[test]
    fn test_empty_encryption_key_refused() {
        let storage = StorageConfig::default();
        // Guard against a leaking env var making this pass vacuously
        if std::env::var(ENCRYPTION_KEY_ENV).is_err() {
            assert!(storage.resolve_encryption_key().is_err());
        }
    }

    #[test]
    fn test_configured_encryption_key_accepted() {
        let storage = StorageConfig {
            encryption_key: "some-key".to_string(),
            ..Default::default()
        };
        if std::env::var(ENCRYPTION_KEY_ENV).is_err() {
            assert_eq!(storage.resolve_encryption_key().unwrap(), "some-key");
        }
    }
}
