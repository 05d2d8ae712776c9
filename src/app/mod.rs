//! Core application logic for Movie Feed
//!
//! This module contains the networking and data-fetch layer: the HTTP
//! client, the response decoder, the domain records, the connectivity
//! monitor and the orchestrators that drive list and detail fetches.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use movie_feed::app::{ClientConfig, ListConfig, ListEvent, MovieClient, PopularMoviesOrchestrator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig {
//!     access_token: "token".to_string(),
//!     ..Default::default()
//! };
//! let client = Arc::new(MovieClient::new(config)?);
//! let list = PopularMoviesOrchestrator::new(client, ListConfig::default());
//!
//! let mut events = list.subscribe();
//! list.spawn_fetch_popular_movies();
//!
//! if let Ok(ListEvent::PopularMoviesResult(Ok(page))) = events.recv().await {
//!     println!("{} movies loaded", page.total);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod connectivity;
pub mod decoder;
pub mod detail;
pub mod models;
pub mod orchestrator;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main public API
pub use client::{ClientConfig, MovieClient};
pub use connectivity::{ConnectivityMonitor, ConnectivityStatus, MonitorConfig, PathProbe, TcpProbe};
pub use decoder::{MoviePage, ResponseDecoder};
pub use detail::MovieDetailFetch;
pub use models::{CastMember, Movie, MovieId, PosterImage, RelatedMovie};
pub use orchestrator::{
    DetailEvent, DetailLoaded, FetchOutcome, FetchState, ListConfig, ListEvent, PageLoaded,
    PopularMoviesOrchestrator,
};
pub use session::{BrowseSession, ReconnectRetry, SessionEvent, SignalListener, create_shutdown_channel};
