//! Configuration Management
//!
//! Handles persistent configuration storage for cvsdk.

use crate::error::{Result, SdkError};
use crate::sdk::http::{HttpSettings, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable consulted when no base URL is configured
pub const BASE_URL_ENV: &str = "CVSDK_BASE_URL";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Web-service base URL, e.g. `https://commserve/webconsole/api/`
    #[serde(default)]
    pub base_url: Option<String>,
    /// Session token sent as the `Authtoken` header
    #[serde(default)]
    pub auth_token: Option<String>,
    /// PEM CA certificate trusted for https servers
    #[serde(default)]
    pub certificate_path: Option<PathBuf>,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Extra or overriding service templates (`{0}` = base URL)
    #[serde(default)]
    pub services: HashMap<String, String>,
    /// Last listed collection
    #[serde(default)]
    pub last_collection: Option<String>,
}

fn default_verify_ssl() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            auth_token: None,
            certificate_path: None,
            verify_ssl: default_verify_ssl(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            services: HashMap::new(),
            last_collection: None,
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cvsdk").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from `path`; a missing or unreadable file yields defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let io_error = |e: std::io::Error| {
            SdkError::configuration(format!("Failed to write {}: {}", path.display(), e))
        };

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SdkError::configuration(format!("Failed to encode config: {}", e)))?;
        std::fs::write(path, content).map_err(io_error)?;

        Ok(())
    }

    /// Get effective base URL (CLI > config > environment)
    pub fn effective_base_url(&self) -> Result<String> {
        self.base_url
            .clone()
            .or_else(|| std::env::var(BASE_URL_ENV).ok())
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                SdkError::configuration(format!(
                    "No server configured. Pass --base-url, set {} or add base_url to the config file",
                    BASE_URL_ENV
                ))
            })
    }

    /// Transport settings derived from this configuration
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: Duration::from_secs(self.timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            auth_token: self.auth_token.clone(),
            certificate_path: self.certificate_path.clone(),
            verify_ssl: self.verify_ssl,
            ..HttpSettings::default()
        }
    }

    /// Set last collection and save
    pub fn set_last_collection(&mut self, key: &str) -> Result<()> {
        self.last_collection = Some(key.to_string());
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json"));
        assert_eq!(config, Config::default());
        assert!(config.verify_ssl);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config {
            base_url: Some("https://cs.example.com/webconsole/api/".to_string()),
            verify_ssl: false,
            ..Config::default()
        };
        config
            .services
            .insert("CUSTOM".to_string(), "{0}Custom".to_string());
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"base_url": "http://cs/api/", "timeout_secs": 5}"#).unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.base_url.as_deref(), Some("http://cs/api/"));
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.connect_timeout_secs, 10);
        assert!(config.verify_ssl);
    }

    #[test]
    fn test_invalid_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_explicit_base_url_wins() {
        let config = Config {
            base_url: Some("http://cs/api/".to_string()),
            ..Config::default()
        };
        assert_eq!(config.effective_base_url().unwrap(), "http://cs/api/");
    }

    #[test]
    fn test_http_settings_carry_timeouts() {
        let config = Config {
            timeout_secs: 7,
            auth_token: Some("QSDK token".to_string()),
            ..Config::default()
        };
        let settings = config.http_settings();
        assert_eq!(settings.timeout, Duration::from_secs(7));
        assert_eq!(settings.auth_token.as_deref(), Some("QSDK token"));
    }
}
