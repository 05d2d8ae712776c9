//! Configuration management for Movie Feed
//!
//! This module provides TOML configuration with multi-source loading:
//! built-in defaults, then a config file, then the API token from the
//! environment. Durations are written as humantime strings ("5s", "1m").

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::app::{ClientConfig, ListConfig, MonitorConfig};
use crate::constants::{api, connectivity, env, files, http, limits, list};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Movie API endpoints and credentials
    pub api: ApiConfigToml,
    /// HTTP transport settings
    pub client: ClientConfigToml,
    /// Connectivity probing
    pub connectivity: ConnectivityConfigToml,
    /// Popular-movies list behaviour
    pub list: ListConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly API configuration
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfigToml {
    /// Bearer token; may be left empty and supplied via the environment
    pub access_token: String,
    /// API base URL
    pub base_url: String,
    /// Prefix for poster and profile image paths
    pub image_base_url: String,
    /// Language requested from every endpoint
    pub language: String,
}

impl Default for ApiConfigToml {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            base_url: api::BASE_URL.to_string(),
            image_base_url: api::IMAGE_BASE_URL.to_string(),
            language: api::DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl std::fmt::Debug for ApiConfigToml {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfigToml")
            .field("access_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("image_base_url", &self.image_base_url)
            .field("language", &self.language)
            .finish()
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfigToml {
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout (absent = no timeout)
    #[serde(with = "humantime_serde")]
    pub pool_idle_timeout: Option<Duration>,
    /// Maximum idle connections per host
    pub pool_max_per_host: usize,
    /// Request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Rate limit for API calls (requests per second)
    pub rate_limit_rps: u32,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            tcp_nodelay: true,
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
        }
    }
}

/// TOML-friendly connectivity configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConnectivityConfigToml {
    /// `host:port` probed for reachability
    pub probe_address: String,
    /// Interval between probes
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Timeout of one probe
    #[serde(with = "humantime_serde")]
    pub probe_timeout: Duration,
}

impl Default for ConnectivityConfigToml {
    fn default() -> Self {
        Self {
            probe_address: connectivity::DEFAULT_PROBE_ADDRESS.to_string(),
            poll_interval: connectivity::DEFAULT_POLL_INTERVAL,
            probe_timeout: connectivity::DEFAULT_PROBE_TIMEOUT,
        }
    }
}

/// TOML-friendly list configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListConfigToml {
    /// Rows before the end of the list at which the next page is fetched
    pub prefetch_distance: usize,
}

impl Default for ListConfigToml {
    fn default() -> Self {
        Self {
            prefetch_distance: list::DEFAULT_PREFETCH_DISTANCE,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Convert TOML-friendly configuration to runtime configuration
    pub fn to_runtime_config(&self) -> (ClientConfig, MonitorConfig, ListConfig) {
        (
            self.client.to_runtime_config(&self.api),
            self.connectivity.to_runtime_config(),
            self.list.to_runtime_config(),
        )
    }

    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (explicit, else the first standard location found)
    /// 3. `MOVIE_FEED_API_TOKEN` from the environment
    ///
    /// The result is not validated; call [`validate`](Self::validate).
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        let mut config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => {
                debug!("No config file found; using defaults");
                Self::default()
            }
        };

        config.apply_token_override(std::env::var(env::API_TOKEN).ok());
        Ok(config)
    }

    /// Replace the configured token with a non-empty override
    pub fn apply_token_override(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            debug!("API token taken from {}", env::API_TOKEN);
            self.api.access_token = token;
        }
    }

    /// Check that the configuration can drive a session
    pub fn validate(&self) -> ConfigResult<()> {
        if self.api.access_token.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "api.access_token".to_string(),
            });
        }

        for (field, value) in [
            ("api.base_url", &self.api.base_url),
            ("api.image_base_url", &self.api.image_base_url),
        ] {
            if let Err(e) = Url::parse(value) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.clone(),
                    reason: e.to_string(),
                });
            }
        }

        if self.client.rate_limit_rps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "client.rate_limit_rps".to_string(),
                value: "0".to_string(),
                reason: "Rate limit must be at least 1 request per second".to_string(),
            });
        }

        if self.connectivity.poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "connectivity.poll_interval".to_string(),
                value: "0s".to_string(),
                reason: "Poll interval must be positive".to_string(),
            });
        }

        Ok(())
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(".").join(files::LOCAL_CONFIG_FILE)];
        if let Ok(path) = Self::default_config_path() {
            search_paths.push(path);
        }

        let found = search_paths.into_iter().find(|path| path.exists());
        match &found {
            Some(path) => debug!("Found config file: {}", path.display()),
            None => debug!("No config file found in standard locations"),
        }
        found
    }

    /// Default config file path for the current user
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir
            .join(files::CONFIG_DIR_NAME)
            .join(files::CONFIG_FILE_NAME))
    }

    /// Load configuration from a TOML file
    pub async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Write a default configuration file
    ///
    /// Refuses to overwrite an existing file unless `force` is set.
    pub async fn write_default(path: &Path, force: bool) -> ConfigResult<()> {
        if path.exists() && !force {
            return Err(ConfigError::InvalidValue {
                field: "path".to_string(),
                value: path.display().to_string(),
                reason: "File already exists; pass --force to overwrite".to_string(),
            });
        }

        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        tokio::fs::write(path, Self::generate_default_config_content())
            .await
            .map_err(io_error)?;

        info!("Wrote default configuration to {}", path.display());
        Ok(())
    }

    /// Effective configuration as TOML, with the token redacted
    pub fn to_redacted_toml(&self) -> ConfigResult<String> {
        let mut shown = self.clone();
        if !shown.api.access_token.is_empty() {
            shown.api.access_token = "<redacted>".to_string();
        }
        Ok(toml::to_string_pretty(&shown)?)
    }

    /// Generate default configuration content with helpful comments
    fn generate_default_config_content() -> String {
        format!(
            r#"# Movie Feed Configuration
# Any setting left out falls back to its default.

[api]
# Bearer token for the movie API. Prefer setting {env_token} instead.
access_token = ""
base_url = "{base_url}"
image_base_url = "{image_base_url}"
language = "{language}"

[client]
tcp_nodelay = true
pool_idle_timeout = "90s"
pool_max_per_host = {pool_max}
request_timeout = "30s"
connect_timeout = "10s"
rate_limit_rps = {rps}

[connectivity]
probe_address = "{probe}"
poll_interval = "5s"
probe_timeout = "3s"

[list]
# Rows before the end of the list at which the next page is fetched
prefetch_distance = {prefetch}

[logging]
level = "info"  # error, warn, info, debug, trace
"#,
            env_token = env::API_TOKEN,
            base_url = api::BASE_URL,
            image_base_url = api::IMAGE_BASE_URL,
            language = api::DEFAULT_LANGUAGE,
            pool_max = http::POOL_MAX_PER_HOST,
            rps = limits::DEFAULT_RATE_LIMIT_RPS,
            probe = connectivity::DEFAULT_PROBE_ADDRESS,
            prefetch = list::DEFAULT_PREFETCH_DISTANCE,
        )
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self, api: &ApiConfigToml) -> ClientConfig {
        ClientConfig {
            api_base_url: api.base_url.clone(),
            image_base_url: api.image_base_url.clone(),
            access_token: api.access_token.clone(),
            language: api.language.clone(),
            tcp_nodelay: self.tcp_nodelay,
            pool_idle_timeout: self.pool_idle_timeout,
            pool_max_per_host: self.pool_max_per_host,
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
            rate_limit_rps: self.rate_limit_rps,
        }
    }
}

impl ConnectivityConfigToml {
    /// Convert to runtime MonitorConfig
    pub fn to_runtime_config(&self) -> MonitorConfig {
        MonitorConfig {
            probe_address: self.probe_address.clone(),
            poll_interval: self.poll_interval,
            probe_timeout: self.probe_timeout,
        }
    }
}

impl ListConfigToml {
    pub fn to_runtime_config(&self) -> ListConfig {
        ListConfig {
            prefetch_distance: self.prefetch_distance,
        }
    }
}
