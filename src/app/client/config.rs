//! HTTP client configuration and building logic
//!
//! This module holds the endpoint, credential and transport settings of the
//! movie API client and builds the underlying `reqwest` client from them.

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::constants::{api, http, limits};

/// Configuration for the movie API client
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API base URL; endpoint paths are joined onto it
    pub api_base_url: String,
    /// Prefix prepended to image paths from API payloads
    pub image_base_url: String,
    /// Bearer token sent on every API call
    pub access_token: String,
    /// Language requested from every endpoint
    pub language: String,
    /// TCP nodelay (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout
    pub pool_idle_timeout: Option<Duration>,
    /// Maximum number of idle connections per host
    pub pool_max_per_host: usize,
    /// Request timeout
    pub request_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Rate limit for API calls (requests per second)
    pub rate_limit_rps: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: api::BASE_URL.to_string(),
            image_base_url: api::IMAGE_BASE_URL.to_string(),
            access_token: String::new(),
            language: api::DEFAULT_LANGUAGE.to_string(),
            tcp_nodelay: true,
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_base_url", &self.api_base_url)
            .field("image_base_url", &self.image_base_url)
            .field("access_token", &"<redacted>")
            .field("language", &self.language)
            .field("tcp_nodelay", &self.tcp_nodelay)
            .field("pool_idle_timeout", &self.pool_idle_timeout)
            .field("pool_max_per_host", &self.pool_max_per_host)
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("rate_limit_rps", &self.rate_limit_rps)
            .finish()
    }
}

impl ClientConfig {
    /// Configuration pointing at custom hosts, e.g. a local mock server
    pub fn with_hosts(
        api_base_url: impl Into<String>,
        image_base_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            image_base_url: image_base_url.into(),
            access_token: access_token.into(),
            ..Default::default()
        }
    }

    /// Builds the HTTP client with the specified configuration
    ///
    /// The bearer token is not baked into default headers: image fetches go
    /// to a different host and must not carry it.
    pub fn build_http_client(&self) -> reqwest::Result<Client> {
        let mut client_builder = Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(http::USER_AGENT)
            .tcp_nodelay(self.tcp_nodelay)
            .pool_max_idle_per_host(self.pool_max_per_host);

        if let Some(idle_timeout) = self.pool_idle_timeout {
            client_builder = client_builder.pool_idle_timeout(idle_timeout);
        }

        client_builder.build()
    }
}
