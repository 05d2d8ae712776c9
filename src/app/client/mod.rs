//! HTTP client for the movie metadata API
//!
//! The client issues the two API calls (popular-movies page, movie detail)
//! and the poster image fetch. The module is organized into:
//! - `config`: client configuration and `reqwest` client building
//! - `http`: rate-limited GETs with status and transport error mapping
//! - `single_flight`: one outstanding request per API operation
//! - `images`: de-duplication of concurrent image downloads

use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use crate::app::decoder::ResponseDecoder;
use crate::app::models::{Movie, MovieId, PosterImage};
use crate::constants::api;
use crate::errors::{ApiRequestError, ClientResult, ConfigError, ServerError};

pub mod config;
pub mod http;
pub mod images;
pub mod single_flight;

pub use config::ClientConfig;
pub use images::InFlightImages;

use http::HttpHandler;
use single_flight::SingleFlight;

/// Client for the movie metadata API
///
/// Shared behind an `Arc` by every orchestrator of a session so that the
/// single-flight slots and the in-flight image set are per client instance.
#[derive(Debug)]
pub struct MovieClient {
    http: Arc<HttpHandler>,
    decoder: Arc<ResponseDecoder>,
    config: ClientConfig,
    popular_movies: SingleFlight,
    movie_details: SingleFlight,
    images: InFlightImages,
}

impl MovieClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the underlying HTTP client cannot be built
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let client = config
            .build_http_client()
            .map_err(|e| ConfigError::InvalidValue {
                field: "client".to_string(),
                value: config.api_base_url.clone(),
                reason: e.to_string(),
            })?;
        let http = HttpHandler::new(client, config.access_token.clone(), config.rate_limit_rps);

        info!("Created movie API client for {}", config.api_base_url);

        Ok(Self {
            http: Arc::new(http),
            decoder: Arc::new(ResponseDecoder::new(config.image_base_url.clone())),
            config,
            popular_movies: SingleFlight::new("popular movies"),
            movie_details: SingleFlight::new("movie details"),
            images: InFlightImages::new(),
        })
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Decoder bound to this client's image host
    pub fn decoder(&self) -> &ResponseDecoder {
        &self.decoder
    }

    /// URL of one popular-movies page
    pub fn popular_movies_url(&self, page: u32) -> Result<Url, ApiRequestError> {
        let mut url = self.endpoint(api::POPULAR_MOVIES_PATH)?;
        url.query_pairs_mut()
            .append_pair("language", &self.config.language)
            .append_pair("page", &page.to_string());
        Ok(url)
    }

    /// URL of a movie's detail, with similar titles and credits appended
    pub fn movie_details_url(&self, movie_id: MovieId) -> Result<Url, ApiRequestError> {
        let mut url = self.endpoint(&format!("{}/{}", api::MOVIE_DETAILS_PATH, movie_id))?;
        url.query_pairs_mut()
            .append_pair("append_to_response", api::DETAIL_APPEND_TO_RESPONSE)
            .append_pair("language", &self.config.language);
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiRequestError> {
        let invalid = |reason: String| ApiRequestError::InvalidUrl {
            url: format!("{}{}", self.config.api_base_url, path),
            reason,
        };
        let mut base = Url::parse(&self.config.api_base_url).map_err(|e| invalid(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(invalid("base URL cannot carry a path".to_string()));
        }
        // `join` replaces the last segment unless the base ends in a slash
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path).map_err(|e| invalid(e.to_string()))
    }

    /// Fetch one page of popular movies
    ///
    /// Supersedes any popular-movies request still pending on this client;
    /// the superseded caller receives `ClientError::Superseded`.
    ///
    /// # Errors
    ///
    /// `Request(InvalidUrl)` if the endpoint cannot be built, `Server` on
    /// transport failure or non-200 status, `Parse` if the body does not
    /// decode.
    pub async fn fetch_popular_movies(&self, page: u32) -> ClientResult<Vec<Movie>> {
        let url = self.popular_movies_url(page)?;
        let http = Arc::clone(&self.http);
        let decoder = Arc::clone(&self.decoder);

        self.popular_movies
            .run(async move {
                let body = http.get_api(&url).await?;
                let movie_page = decoder.decode_popular_movies(&body).map_err(|e| {
                    warn!("Popular movies page {} did not decode: {:?}", page, e);
                    e
                })?;
                debug!(
                    "Popular movies page {} returned {} movies ({:?} total results)",
                    page,
                    movie_page.movies.len(),
                    movie_page.total_results
                );
                Ok(movie_page.movies)
            })
            .await
    }

    /// Fetch a movie's detail with credits and similar titles
    ///
    /// Same single-flight rule and error taxonomy as
    /// [`fetch_popular_movies`](Self::fetch_popular_movies).
    pub async fn fetch_movie_details(&self, movie_id: MovieId) -> ClientResult<Movie> {
        let url = self.movie_details_url(movie_id)?;
        let http = Arc::clone(&self.http);
        let decoder = Arc::clone(&self.decoder);

        self.movie_details
            .run(async move {
                let body = http.get_api(&url).await?;
                let movie = decoder.decode_movie_details(&body).map_err(|e| {
                    warn!("Details of movie {} did not decode: {:?}", movie_id, e);
                    e
                })?;
                Ok(movie)
            })
            .await
    }

    /// Download and decode an image
    ///
    /// Returns `Ok(None)` without issuing a request if the same URL is
    /// already being downloaded. The URL leaves the in-flight set when this
    /// call finishes, whatever the outcome.
    ///
    /// # Errors
    ///
    /// `Server(ImageDownloadFailure)` on transport failure, non-success
    /// status or undecodable bytes.
    pub async fn download_image(&self, url: &Url) -> ClientResult<Option<PosterImage>> {
        let Some(_claim) = self.images.try_begin(url) else {
            debug!("Image {} already in flight; skipping", url);
            return Ok(None);
        };

        let bytes = self.http.get_image(url).await?;

        let decoded = tokio::task::spawn_blocking(move || PosterImage::decode(bytes))
            .await
            .map_err(|e| {
                warn!("Image decode task failed: {}", e);
                ServerError::ImageDownloadFailure
            })?;

        match decoded {
            Ok(image) => {
                debug!("Downloaded image {} ({}x{})", url, image.width, image.height);
                Ok(Some(image))
            }
            Err(e) => {
                warn!("Image {} could not be decoded: {}", url, e);
                Err(ServerError::ImageDownloadFailure.into())
            }
        }
    }

    /// Forget all in-flight image downloads
    pub fn flush_image_downloads(&self) -> usize {
        self.images.flush()
    }

    /// Whether `url` is currently being downloaded
    pub fn is_downloading(&self, url: &Url) -> bool {
        self.images.contains(url)
    }

    /// Number of image downloads currently tracked
    pub fn in_flight_image_count(&self) -> usize {
        self.images.len()
    }

    /// Cancel a pending popular-movies request
    pub fn cancel_popular_movies(&self) -> bool {
        self.popular_movies.cancel()
    }

    /// Cancel a pending movie-detail request
    pub fn cancel_movie_details(&self) -> bool {
        self.movie_details.cancel()
    }
}

#[cfg(test)]
mod tests;
