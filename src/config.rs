//! Top-level application configuration.
//!
//! Configuration is stored as YAML in the user's config directory (or at the
//! path named by `CONSULT_FEED_CONFIG`) and includes:
//! - Backend base URL and API token
//! - Request timeout and debounce window
//! - Page size and the theme filter bound

use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{FeedError, Result};
use crate::filter::DEFAULT_PAGE_SIZE;

pub const CONFIG_PATH_ENV: &str = "CONSULT_FEED_CONFIG";
pub const BACKEND_URL_ENV: &str = "CONSULT_FEED_BACKEND_URL";
pub const API_TOKEN_ENV: &str = "CONSULT_FEED_API_TOKEN";

/// Keys accepted by `config set`.
pub const VALID_KEYS: &[&str] = &[
    "backend_url",
    "auth.token",
    "request_timeout",
    "debounce_ms",
    "page_size",
    "max_theme_filters",
];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the analysis backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_url: Option<String>,

    /// Authentication
    #[serde(default)]
    pub auth: AuthConfig,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Debounce window for filter changes in milliseconds (default: 500)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Responses per page (default: 50)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Maximum number of simultaneous theme filters (default: unbounded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_theme_filters: Option<usize>,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: None,
            auth: AuthConfig::default(),
            request_timeout: default_request_timeout(),
            debounce_ms: default_debounce_ms(),
            page_size: default_page_size(),
            max_theme_filters: None,
        }
    }
}

/// Authentication configuration
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        if let Ok(path) = env::var(CONFIG_PATH_ENV)
            && !path.is_empty()
        {
            return PathBuf::from(path);
        }

        ProjectDirs::from("org", "consult", "consult-feed")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
            .unwrap_or_else(|| PathBuf::from(".consult-feed").join("config.yaml"))
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.validate()?;
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(FeedError::Config("page_size must be at least 1".to_string()));
        }
        if self.max_theme_filters == Some(0) {
            return Err(FeedError::Config(
                "max_theme_filters must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the backend URL from environment variable or config
    pub fn backend_url(&self) -> Option<String> {
        if let Ok(url) = env::var(BACKEND_URL_ENV)
            && !url.is_empty()
        {
            return Some(url);
        }

        self.backend_url.clone()
    }

    /// Get the API token from environment variable or config
    pub fn api_token(&self) -> Option<String> {
        if let Ok(token) = env::var(API_TOKEN_ENV)
            && !token.is_empty()
        {
            return Some(token);
        }

        self.auth.token.clone()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Set a value by its dotted key, parsing it to the field's type.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "backend_url" => {
                url::Url::parse(value).map_err(|e| {
                    FeedError::Config(format!("invalid backend URL '{value}': {e}"))
                })?;
                self.backend_url = Some(value.to_string());
            }
            "auth.token" => self.auth.token = Some(value.to_string()),
            "request_timeout" => self.request_timeout = parse_number(key, value)?,
            "debounce_ms" => self.debounce_ms = parse_number(key, value)?,
            "page_size" => self.page_size = parse_number(key, value)?,
            "max_theme_filters" => {
                self.max_theme_filters = match value {
                    "none" | "unbounded" => None,
                    other => Some(parse_number(key, other)?),
                }
            }
            _ => {
                return Err(FeedError::Config(format!(
                    "unknown config key '{key}'. Valid keys: {}",
                    VALID_KEYS.join(", ")
                )));
            }
        }
        self.validate()
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| FeedError::Config(format!("'{value}' is not a valid number for {key}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.backend_url.is_none());
        assert!(config.auth.token.is_none());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert_eq!(config.page_size, 50);
        assert_eq!(config.max_theme_filters, None);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config =
            serde_yaml_ng::from_str("backend_url: http://localhost:8000\npage_size: 10\n").unwrap();
        assert_eq!(config.backend_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(config.page_size, 10);
        assert_eq!(config.debounce_ms, 500);
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.set_value("backend_url", "https://backend.example").unwrap();
        config.set_value("auth.token", "tok_123").unwrap();
        config.set_value("max_theme_filters", "3").unwrap();

        let yaml = serde_yaml_ng::to_string(&config).unwrap();
        let parsed: Config = serde_yaml_ng::from_str(&yaml).unwrap();

        assert_eq!(parsed.backend_url.as_deref(), Some("https://backend.example"));
        assert_eq!(parsed.auth.token.as_deref(), Some("tok_123"));
        assert_eq!(parsed.max_theme_filters, Some(3));
    }

    #[test]
    fn test_set_value_rejects_bad_input() {
        let mut config = Config::default();
        assert!(config.set_value("page_size", "lots").is_err());
        assert!(config.set_value("page_size", "0").is_err());
        assert!(config.set_value("backend_url", "not a url").is_err());
        assert!(config.set_value("colour", "blue").is_err());
    }

    #[test]
    fn test_max_theme_filters_can_be_cleared() {
        let mut config = Config::default();
        config.set_value("max_theme_filters", "2").unwrap();
        config.set_value("max_theme_filters", "none").unwrap();
        assert_eq!(config.max_theme_filters, None);
    }

    #[test]
    fn test_auth_debug_redacts_token() {
        let auth = AuthConfig {
            token: Some("secret-token".to_string()),
        };
        let debug = format!("{auth:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }
}
