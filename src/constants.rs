//! Application constants for Movie Feed
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names
pub mod env {
    /// Environment variable overriding the API bearer token
    pub const API_TOKEN: &str = "MOVIE_FEED_API_TOKEN";
}

/// Movie metadata API endpoints and query defaults
pub mod api {
    /// Base URL of the movie metadata API (trailing slash required for joins)
    pub const BASE_URL: &str = "https://api.themoviedb.org/3/";

    /// Image host prefix prepended to poster, backdrop and profile paths
    pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w780";

    /// Path of the popular-movies listing, relative to the base URL
    pub const POPULAR_MOVIES_PATH: &str = "movie/popular";

    /// Path prefix of the movie detail endpoint, relative to the base URL
    pub const MOVIE_DETAILS_PATH: &str = "movie";

    /// Sub-resources appended to a detail request
    pub const DETAIL_APPEND_TO_RESPONSE: &str = "similar,credits";

    /// Language requested from every endpoint
    pub const DEFAULT_LANGUAGE: &str = "en-US";

    /// Date format of `release_date`
    pub const RELEASE_DATE_FORMAT: &str = "%Y-%m-%d";

    /// First page of the popular-movies feed
    pub const FIRST_PAGE: u32 = 1;
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "Movie-Feed/0.1.0";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 8;
}

/// Rate limiting configuration
pub mod limits {
    /// Default rate limit for API requests (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 20;
}

/// Connectivity monitoring defaults
pub mod connectivity {
    use super::Duration;

    /// Address probed to decide whether the network path is usable
    pub const DEFAULT_PROBE_ADDRESS: &str = "api.themoviedb.org:443";

    /// Interval between path probes
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

    /// Timeout of a single probe connection
    pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

    /// Capacity of the connectivity broadcast channel
    pub const EVENT_CHANNEL_CAPACITY: usize = 16;
}

/// Popular-movies list behaviour
pub mod list {
    /// Rows before the end of the list at which the next page is prefetched
    pub const DEFAULT_PREFETCH_DISTANCE: usize = 10;

    /// Capacity of the list and detail event channels
    pub const EVENT_CHANNEL_CAPACITY: usize = 256;
}

/// Configuration file locations
pub mod files {
    /// Project-local configuration file name
    pub const LOCAL_CONFIG_FILE: &str = "movie-feed.toml";

    /// Directory under the user config dir
    pub const CONFIG_DIR_NAME: &str = "movie-feed";

    /// File name inside the user config directory
    pub const CONFIG_FILE_NAME: &str = "config.toml";
}

// Re-export commonly used constants for convenience
pub use api::{BASE_URL as API_BASE_URL, IMAGE_BASE_URL};
pub use env::API_TOKEN as ENV_API_TOKEN;
pub use http::USER_AGENT;
pub use limits::DEFAULT_RATE_LIMIT_RPS;
pub use list::DEFAULT_PREFETCH_DISTANCE;
