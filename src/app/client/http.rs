//! Core HTTP operations with rate limiting and error normalization
//!
//! API calls are throttled, carry the bearer token and must answer 200.
//! Image fetches skip both. No request is retried here; retries belong to
//! the orchestrators.

use std::num::NonZeroU32;
use std::time::Duration;

use bytes::Bytes;
use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use url::Url;

use crate::errors::{ClientResult, ServerError};

/// HTTP operations handler
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    access_token: String,
    rate_limiter: RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>,
}

impl HttpHandler {
    /// Creates a new HttpHandler
    ///
    /// A zero `rate_limit_rps` is clamped to one request per second.
    pub fn new(client: Client, access_token: impl Into<String>, rate_limit_rps: u32) -> Self {
        Self {
            client,
            access_token: access_token.into(),
            rate_limiter: Self::build_rate_limiter(rate_limit_rps),
        }
    }

    fn build_rate_limiter(
        rate_limit_rps: u32,
    ) -> RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock> {
        let rps = NonZeroU32::new(rate_limit_rps).unwrap_or(NonZeroU32::MIN);
        RateLimiter::direct(Quota::per_second(rps))
    }

    /// GET an API endpoint and return the body of a 200 response
    ///
    /// # Errors
    ///
    /// `ServerError::Timeout` when the request times out, `ServiceDown` on
    /// HTTP 503, `General` on any other transport failure or status.
    pub async fn get_api(&self, url: &Url) -> ClientResult<Bytes> {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(25)))
            .await;

        tracing::debug!("GET {}", url.path());

        let response = self
            .client
            .get(url.as_str())
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Request to {} failed: {}", url.path(), e);
                classify_transport_error(&e)
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!("Request to {} returned HTTP {}", url.path(), status);
            return Err(classify_status(status).into());
        }

        let body = response.bytes().await.map_err(|e| {
            tracing::warn!("Reading body of {} failed: {}", url.path(), e);
            classify_transport_error(&e)
        })?;

        tracing::debug!("Fetched {} ({} bytes)", url.path(), body.len());
        Ok(body)
    }

    /// GET raw image bytes; every failure is an image download failure
    pub async fn get_image(&self, url: &Url) -> Result<Bytes, ServerError> {
        let response = self.client.get(url.as_str()).send().await.map_err(|e| {
            tracing::warn!("Image request {} failed: {}", url, e);
            ServerError::ImageDownloadFailure
        })?;

        if !response.status().is_success() {
            tracing::warn!("Image request {} returned HTTP {}", url, response.status());
            return Err(ServerError::ImageDownloadFailure);
        }

        response.bytes().await.map_err(|e| {
            tracing::warn!("Reading image {} failed: {}", url, e);
            ServerError::ImageDownloadFailure
        })
    }

    /// Get a reference to the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Map a transport error onto the presentation taxonomy
fn classify_transport_error(err: &reqwest::Error) -> ServerError {
    if err.is_timeout() {
        ServerError::Timeout
    } else {
        ServerError::General
    }
}

/// Map a non-200 status onto the presentation taxonomy
fn classify_status(status: StatusCode) -> ServerError {
    match status {
        StatusCode::SERVICE_UNAVAILABLE => ServerError::ServiceDown,
        _ => ServerError::General,
    }
}
