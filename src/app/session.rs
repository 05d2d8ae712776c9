//! Browse session wiring connectivity to the active view
//!
//! A [`BrowseSession`] holds the shared client, the popular-movies list and
//! the detail view currently open, if any. It consumes connectivity events:
//! every status is re-published as [`SessionEvent::ConnectivityChanged`],
//! and a `Connected` status flushes the in-flight image set and retries the
//! active view's top-level fetch.
//!
//! Shutdown follows a broadcast channel; [`SignalListener`] turns Ctrl+C
//! and SIGTERM into a message on it.

use std::sync::Arc;

use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::client::MovieClient;
use crate::app::connectivity::ConnectivityStatus;
use crate::app::detail::MovieDetailFetch;
use crate::app::models::Movie;
use crate::app::orchestrator::{DetailLoaded, FetchOutcome, ListConfig, PageLoaded, PopularMoviesOrchestrator};
use crate::constants::connectivity;

/// Events published by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    ConnectivityChanged(ConnectivityStatus),
}

/// Retry started in response to a connectivity event
#[derive(Debug)]
pub enum ReconnectRetry {
    /// Nothing to retry
    None,
    /// The list retry, which may still decide to do nothing
    List(JoinHandle<FetchOutcome<PageLoaded>>),
    /// The open detail view is re-fetched
    Detail(JoinHandle<FetchOutcome<DetailLoaded>>),
}

/// Popular-movies browsing with an optional detail view on top
#[derive(Debug)]
pub struct BrowseSession {
    client: Arc<MovieClient>,
    list: PopularMoviesOrchestrator,
    detail: Mutex<Option<MovieDetailFetch>>,
    events: broadcast::Sender<SessionEvent>,
}

impl BrowseSession {
    pub fn new(client: Arc<MovieClient>, list_config: ListConfig) -> Self {
        let list = PopularMoviesOrchestrator::new(Arc::clone(&client), list_config);
        let (events, _) = broadcast::channel(connectivity::EVENT_CHANNEL_CAPACITY);
        Self {
            client,
            list,
            detail: Mutex::new(None),
            events,
        }
    }

    pub fn client(&self) -> &Arc<MovieClient> {
        &self.client
    }

    /// The popular-movies list
    pub fn list(&self) -> &PopularMoviesOrchestrator {
        &self.list
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Make a detail view for `movie` the active view
    ///
    /// The caller subscribes to the returned fetch and starts it. An
    /// already open detail view is replaced.
    pub async fn open_detail(&self, movie: Arc<Movie>) -> MovieDetailFetch {
        let detail = MovieDetailFetch::new(movie, Arc::clone(&self.client));
        let previous = self.detail.lock().await.replace(detail.clone());
        if let Some(previous) = previous {
            debug!("Detail of movie {} replaced", previous.movie_id());
        }
        info!("Opened detail of movie {}", detail.movie_id());
        detail
    }

    /// Return to the list, cancelling a pending detail request
    pub async fn close_detail(&self) -> Option<MovieDetailFetch> {
        let closed = self.detail.lock().await.take();
        if let Some(detail) = &closed {
            self.client.cancel_movie_details();
            info!("Closed detail of movie {}", detail.movie_id());
        }
        closed
    }

    /// The open detail view, if any
    pub async fn active_detail(&self) -> Option<MovieDetailFetch> {
        self.detail.lock().await.clone()
    }

    /// React to one connectivity observation
    pub async fn handle_connectivity(&self, status: ConnectivityStatus) -> ReconnectRetry {
        let _ = self.events.send(SessionEvent::ConnectivityChanged(status));

        if status == ConnectivityStatus::Disconnected {
            return ReconnectRetry::None;
        }

        let flushed = self.client.flush_image_downloads();
        if flushed > 0 {
            debug!("Flushed {} in-flight image downloads", flushed);
        }

        match self.active_detail().await {
            Some(detail) => {
                info!("Connectivity restored; re-fetching detail of movie {}", detail.movie_id());
                ReconnectRetry::Detail(detail.spawn_fetch())
            }
            None => {
                info!("Connectivity restored; checking list for retry");
                ReconnectRetry::List(self.list.spawn_retry_after_reconnect())
            }
        }
    }

    /// Consume connectivity events until shutdown
    ///
    /// Also returns when the connectivity channel closes.
    pub async fn run(
        &self,
        mut connectivity: broadcast::Receiver<ConnectivityStatus>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Browse session shutting down");
                    break;
                }
                status = connectivity.recv() => match status {
                    Ok(status) => {
                        self.handle_connectivity(status).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Missed {} connectivity events", skipped);
                    }
                    Err(RecvError::Closed) => {
                        debug!("Connectivity channel closed");
                        break;
                    }
                },
            }
        }
    }
}

/// Create a shutdown broadcaster
pub fn create_shutdown_channel() -> (broadcast::Sender<()>, broadcast::Receiver<()>) {
    broadcast::channel(1)
}

/// Broadcasts shutdown on Ctrl+C or SIGTERM
pub struct SignalListener {
    shutdown_tx: broadcast::Sender<()>,
}

impl SignalListener {
    pub fn new(shutdown_tx: broadcast::Sender<()>) -> Self {
        Self { shutdown_tx }
    }

    /// Start listening on a background task
    pub fn spawn(&self) -> JoinHandle<()> {
        let shutdown_tx = self.shutdown_tx.clone();

        tokio::spawn(async move {
            let ctrl_c = async {
                if let Err(e) = signal::ctrl_c().await {
                    warn!("Failed to listen for Ctrl+C: {}", e);
                    std::future::pending::<()>().await;
                }
            };

            #[cfg(unix)]
            let terminate = async {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                    }
                    Err(e) => {
                        warn!("Failed to listen for SIGTERM: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
                _ = terminate => info!("Received terminate signal, shutting down"),
            }

            let _ = shutdown_tx.send(());
        })
    }
}
