// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Configuration for the FastMoss aggregation layer
//!
//! Settings are loaded with the `config` crate from, in increasing priority:
//! built-in defaults, an optional `fastmoss.json`, an optional
//! `fastmoss.{ENVIRONMENT}.json`, and `FASTMOSS_*` environment variables
//! (nested keys use `__`, e.g. `FASTMOSS_OPEN_API__CLIENT_ID`).

use std::{fmt, time::Duration};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer, Serialize, de};
use url::Url;

const DEFAULT_OPEN_API_BASE_URL: &str = "https://openapi.fastmoss.com";
const DEFAULT_WEB_API_BASE_URL: &str = "https://www.fastmoss.com/api";
const DEFAULT_WEB_REFERER: &str = "https://www.fastmoss.com/";
const DEFAULT_WEB_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const DEFAULT_TIMEOUT_SECONDS: u64 = 15;
const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;
const DEFAULT_CACHE_SOFT_LIMIT: usize = 200;
const DEFAULT_TOKEN_REFRESH_BUFFER_SECONDS: u64 = 60;

/// A validated request timeout in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeoutSeconds(u64);

impl TimeoutSeconds {
    /// Create a new `TimeoutSeconds`, ensuring the value is within 1..=300
    pub fn new(seconds: u64) -> Result<Self, String> {
        if seconds == 0 {
            return Err("timeout must be greater than 0".to_string());
        }
        if seconds > 300 {
            return Err("timeout cannot exceed 300".to_string());
        }
        Ok(Self(seconds))
    }

    /// The timeout as a duration
    pub fn value(&self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl Default for TimeoutSeconds {
    fn default() -> Self {
        Self(DEFAULT_TIMEOUT_SECONDS)
    }
}

impl<'de> Deserialize<'de> for TimeoutSeconds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Self::new(seconds).map_err(de::Error::custom)
    }
}

/// Open API client credentials, both guaranteed non-empty
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    /// Build credentials, returning `None` if either part is blank
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Option<Self> {
        let client_id = client_id.into().trim().to_string();
        let client_secret = client_secret.into().trim().to_string();
        if client_id.is_empty() || client_secret.is_empty() {
            return None;
        }
        Some(Self {
            client_id,
            client_secret,
        })
    }

    /// Client identifier
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Client secret
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Authenticated Open API settings
#[derive(Clone, Serialize, Deserialize)]
pub struct OpenApiSettings {
    /// Base URL, without trailing slash
    pub base_url: String,
    /// Client identifier; empty disables the Open API
    #[serde(default)]
    pub client_id: String,
    /// Client secret; empty disables the Open API
    #[serde(default)]
    pub client_secret: String,
}

impl OpenApiSettings {
    /// Credentials, if both parts are configured
    pub fn credentials(&self) -> Option<Credentials> {
        Credentials::new(self.client_id.as_str(), self.client_secret.as_str())
    }
}

impl fmt::Debug for OpenApiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenApiSettings")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl Default for OpenApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPEN_API_BASE_URL.to_string(),
            client_id: String::new(),
            client_secret: String::new(),
        }
    }
}

/// Unauthenticated Web API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebApiSettings {
    /// Base URL including the `/api` prefix
    pub base_url: String,
    /// Browser user agent sent with every call
    pub user_agent: String,
    /// Referer sent with every call
    pub referer: String,
}

impl Default for WebApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_WEB_API_BASE_URL.to_string(),
            user_agent: DEFAULT_WEB_USER_AGENT.to_string(),
            referer: DEFAULT_WEB_REFERER.to_string(),
        }
    }
}

/// Response cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Entry lifetime in seconds
    pub ttl_seconds: u64,
    /// Entry count above which a write sweeps expired entries
    pub soft_limit: usize,
}

impl CacheSettings {
    /// Entry lifetime
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            soft_limit: DEFAULT_CACHE_SOFT_LIMIT,
        }
    }
}

/// Complete aggregation layer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataConfig {
    /// Open API settings
    pub open_api: OpenApiSettings,
    /// Web API settings
    pub web_api: WebApiSettings,
    /// Per-call transport timeout (validated range: 1-300)
    pub timeout_seconds: TimeoutSeconds,
    /// Response cache settings
    pub cache: CacheSettings,
    /// Tokens expiring within this many seconds are refreshed before use
    pub token_refresh_buffer_seconds: u64,
    /// Backfill missing Open API product images from the Web API
    pub image_backfill: bool,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            open_api: OpenApiSettings::default(),
            web_api: WebApiSettings::default(),
            timeout_seconds: TimeoutSeconds::default(),
            cache: CacheSettings::default(),
            token_refresh_buffer_seconds: DEFAULT_TOKEN_REFRESH_BUFFER_SECONDS,
            image_backfill: false,
        }
    }
}

impl MarketDataConfig {
    /// Load configuration from files and the environment, then validate it
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration using the config crate with hierarchical sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. Configuration file (fastmoss.json)
    /// 3. Environment-specific file (fastmoss.{env}.json)
    /// 4. Environment variables with the `FASTMOSS_` prefix
    pub fn load() -> Result<Self, ConfigError> {
        let env_var = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .set_default("open_api.base_url", DEFAULT_OPEN_API_BASE_URL)?
            .set_default("open_api.client_id", "")?
            .set_default("open_api.client_secret", "")?
            .set_default("web_api.base_url", DEFAULT_WEB_API_BASE_URL)?
            .set_default("web_api.user_agent", DEFAULT_WEB_USER_AGENT)?
            .set_default("web_api.referer", DEFAULT_WEB_REFERER)?
            .set_default("timeout_seconds", DEFAULT_TIMEOUT_SECONDS)?
            .set_default("cache.ttl_seconds", DEFAULT_CACHE_TTL_SECONDS)?
            .set_default("cache.soft_limit", DEFAULT_CACHE_SOFT_LIMIT as u64)?
            .set_default(
                "token_refresh_buffer_seconds",
                DEFAULT_TOKEN_REFRESH_BUFFER_SECONDS,
            )?
            .set_default("image_backfill", false)?
            .add_source(File::with_name("fastmoss.json").required(false))
            .add_source(
                File::with_name(&format!("fastmoss.{}.json", env_var.to_lowercase()))
                    .required(false),
            )
            .add_source(
                Environment::with_prefix("FASTMOSS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Check that both base URLs parse
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("open_api.base_url", &self.open_api.base_url),
            ("web_api.base_url", &self.web_api.base_url),
        ] {
            Url::parse(value)
                .map_err(|e| ConfigError::Message(format!("invalid {name} '{value}': {e}")))?;
        }
        Ok(())
    }

    /// Configuration pointing both upstreams at local endpoints, for tests
    pub fn for_testing(open_api_base_url: &str, web_api_base_url: &str) -> Self {
        Self {
            open_api: OpenApiSettings {
                base_url: open_api_base_url.to_string(),
                client_id: "test-client".to_string(),
                client_secret: "test-secret".to_string(),
            },
            web_api: WebApiSettings {
                base_url: web_api_base_url.to_string(),
                ..WebApiSettings::default()
            },
            timeout_seconds: TimeoutSeconds(5),
            ..Self::default()
        }
    }

    /// Token refresh buffer as a duration
    pub fn token_refresh_buffer(&self) -> Duration {
        Duration::from_secs(self.token_refresh_buffer_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_validation() {
        assert!(TimeoutSeconds::new(0).is_err());
        assert!(TimeoutSeconds::new(301).is_err());
        assert!(TimeoutSeconds::new(1).is_ok());
        assert_eq!(
            TimeoutSeconds::default().value(),
            Duration::from_secs(15)
        );
    }

    #[test]
    fn credentials_require_both_parts() {
        assert!(Credentials::new("id", "secret").is_some());
        assert!(Credentials::new("", "secret").is_none());
        assert!(Credentials::new("id", "   ").is_none());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let settings = OpenApiSettings {
            client_secret: "top-secret".to_string(),
            ..OpenApiSettings::default()
        };
        assert!(!format!("{settings:?}").contains("top-secret"));

        let credentials = Credentials::new("id", "top-secret").unwrap();
        assert!(!format!("{credentials:?}").contains("top-secret"));
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = MarketDataConfig::default();
        assert_eq!(config.cache.ttl(), Duration::from_secs(300));
        assert_eq!(config.cache.soft_limit, 200);
        assert_eq!(config.token_refresh_buffer(), Duration::from_secs(60));
        assert!(config.open_api.credentials().is_none());
        assert!(!config.image_backfill);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_urls() {
        let mut config = MarketDataConfig::default();
        config.web_api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserializes_from_json_overrides() {
        let config: MarketDataConfig = Config::builder()
            .add_source(config::File::from_str(
                r#"{
                    "open_api": {"base_url": "http://localhost:1", "client_id": "id", "client_secret": "s"},
                    "web_api": {"base_url": "http://localhost:2", "user_agent": "ua", "referer": "r"},
                    "timeout_seconds": 20,
                    "cache": {"ttl_seconds": 60, "soft_limit": 10},
                    "token_refresh_buffer_seconds": 30,
                    "image_backfill": true
                }"#,
                config::FileFormat::Json,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.timeout_seconds.value(), Duration::from_secs(20));
        assert!(config.open_api.credentials().is_some());
        assert!(config.image_backfill);
    }
}
