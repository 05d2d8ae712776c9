//! Prelude module for Movie Feed Library
//!
//! This module re-exports the most commonly used items from the library,
//! providing a convenient way to import everything needed for typical usage
//! with a single `use movie_feed::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use movie_feed::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None).await?;
//!     config.validate()?;
//!     let (client_config, _, list_config) = config.to_runtime_config();
//!
//!     let client = Arc::new(MovieClient::new(client_config)?);
//!     let session = BrowseSession::new(client, list_config);
//!     session.list().fetch_popular_movies().await;
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, ClientError, Result, ServerError};

// Essential app components that are used in most integrations
pub use crate::app::{
    BrowseSession,
    CastMember,
    ClientConfig,
    ConnectivityMonitor,
    ConnectivityStatus,
    DetailEvent,
    FetchOutcome,
    FetchState,
    ListConfig,
    ListEvent,
    MonitorConfig,
    // Data types
    Movie,
    // Core orchestration
    MovieClient,
    MovieDetailFetch,
    PopularMoviesOrchestrator,
    PosterImage,
    RelatedMovie,
    SessionEvent,
};

pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{DEFAULT_PREFETCH_DISTANCE, DEFAULT_RATE_LIMIT_RPS, ENV_API_TOKEN};

pub use std::sync::Arc;

// Common external crate re-exports for convenience
pub use tokio;
