//! Fetch orchestration for the popular-movies list
//!
//! [`PopularMoviesOrchestrator`] owns the list state machine, the page
//! cursor and the thumbnail requests of one list. Results are published as
//! [`ListEvent`]s on a broadcast channel; subscribers receive them on
//! whatever task they poll from, which is how presentation code moves them
//! onto its own execution context.
//!
//! State lives behind an async mutex and is never held across a network
//! call, so the orchestrator can be cloned freely and driven from several
//! tasks at once.

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::client::MovieClient;
use crate::app::models::Movie;
use crate::constants::list;
use crate::errors::ServerError;

pub mod events;
pub mod state;

pub use events::{DetailEvent, DetailLoaded, FetchOutcome, ListEvent};
pub use state::{FetchState, FetchTicket, ListState, PageLoaded};

/// Runtime settings of the list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListConfig {
    /// Rows before the end of the list at which the next page is fetched
    pub prefetch_distance: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            prefetch_distance: list::DEFAULT_PREFETCH_DISTANCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    /// User- or scroll-triggered; ignored while a fetch is running
    Normal,
    /// Connectivity restored; retries a failed or stalled fetch only
    Reconnect,
}

/// Moves the list to `Error` when a started fetch's future is dropped
/// before completing (a timeout, `select!`, an aborted `JoinHandle`)
struct PendingFetch {
    inner: Arc<Inner>,
    ticket: FetchTicket,
    armed: bool,
}

impl PendingFetch {
    fn new(inner: &Arc<Inner>, ticket: FetchTicket) -> Self {
        Self {
            inner: Arc::clone(inner),
            ticket,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PendingFetch {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let ticket = self.ticket;
        if let Ok(mut state) = self.inner.state.try_lock() {
            if state.complete_failure(&ticket) {
                debug!("Page {} fetch dropped before completing", ticket.page);
            }
            return;
        }

        // State is locked elsewhere; fail the ticket once the lock is free
        let inner = Arc::clone(&self.inner);
        let task = async move {
            if inner.state.lock().await.complete_failure(&ticket) {
                debug!("Page {} fetch dropped before completing", ticket.page);
            }
        };
        let runtime = self.inner.runtime.clone().or_else(|| Handle::try_current().ok());
        match runtime {
            Some(runtime) => {
                runtime.spawn(task);
            }
            None => warn!("Page {} fetch dropped outside a runtime", ticket.page),
        }
    }
}

#[derive(Debug)]
struct Inner {
    client: Arc<MovieClient>,
    config: ListConfig,
    state: Mutex<ListState>,
    events: broadcast::Sender<ListEvent>,
    runtime: Option<Handle>,
}

/// Orchestrates page fetches and thumbnails of the popular-movies list
#[derive(Debug, Clone)]
pub struct PopularMoviesOrchestrator {
    inner: Arc<Inner>,
}

impl PopularMoviesOrchestrator {
    /// Create an orchestrator that spawns background work on the current runtime
    pub fn new(client: Arc<MovieClient>, config: ListConfig) -> Self {
        Self::build(client, config, None)
    }

    /// Create an orchestrator that spawns background work on `runtime`
    pub fn on_runtime(client: Arc<MovieClient>, config: ListConfig, runtime: Handle) -> Self {
        Self::build(client, config, Some(runtime))
    }

    fn build(client: Arc<MovieClient>, config: ListConfig, runtime: Option<Handle>) -> Self {
        let (events, _) = broadcast::channel(list::EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                client,
                config,
                state: Mutex::new(ListState::new()),
                events,
                runtime,
            }),
        }
    }

    /// Receive list events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ListEvent> {
        self.inner.events.subscribe()
    }

    pub fn client(&self) -> &Arc<MovieClient> {
        &self.inner.client
    }

    pub async fn fetch_state(&self) -> FetchState {
        self.inner.state.lock().await.fetch_state()
    }

    pub async fn page_cursor(&self) -> u32 {
        self.inner.state.lock().await.page_cursor()
    }

    /// Snapshot of the accumulated list
    pub async fn movies(&self) -> Vec<Arc<Movie>> {
        self.inner.state.lock().await.movies().to_vec()
    }

    pub async fn movie_at(&self, index: usize) -> Option<Arc<Movie>> {
        self.inner.state.lock().await.movie_at(index)
    }

    pub async fn len(&self) -> usize {
        self.inner.state.lock().await.movies().len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Fetch the page at the cursor and append it to the list
    ///
    /// Ignored while a fetch is already running.
    pub async fn fetch_popular_movies(&self) -> FetchOutcome<PageLoaded> {
        self.run_fetch(FetchMode::Normal).await
    }

    /// Explicit user retry; same guard as a normal fetch
    pub async fn refresh(&self) -> FetchOutcome<PageLoaded> {
        self.run_fetch(FetchMode::Normal).await
    }

    /// Retry after connectivity comes back
    ///
    /// Re-issues the page at the cursor when the last fetch failed, or
    /// supersedes a fetch still pending. A loaded list is left alone.
    pub async fn retry_after_reconnect(&self) -> FetchOutcome<PageLoaded> {
        self.run_fetch(FetchMode::Reconnect).await
    }

    /// Run [`fetch_popular_movies`](Self::fetch_popular_movies) in the background
    pub fn spawn_fetch_popular_movies(&self) -> JoinHandle<FetchOutcome<PageLoaded>> {
        let this = self.clone();
        self.spawn(async move { this.fetch_popular_movies().await })
    }

    /// Run [`retry_after_reconnect`](Self::retry_after_reconnect) in the background
    pub fn spawn_retry_after_reconnect(&self) -> JoinHandle<FetchOutcome<PageLoaded>> {
        let this = self.clone();
        self.spawn(async move { this.retry_after_reconnect().await })
    }

    /// Notify that row `index` is being displayed
    ///
    /// Starts the next page fetch when the row is `prefetch_distance` rows
    /// from the end and no fetch is running.
    pub async fn item_displayed(&self, index: usize) -> Option<JoinHandle<FetchOutcome<PageLoaded>>> {
        let prefetch = self
            .inner
            .state
            .lock()
            .await
            .should_prefetch(index, self.inner.config.prefetch_distance);

        if prefetch {
            debug!("Row {} displayed; prefetching next page", index);
            Some(self.spawn_fetch_popular_movies())
        } else {
            None
        }
    }

    async fn run_fetch(&self, mode: FetchMode) -> FetchOutcome<PageLoaded> {
        let ticket = {
            let mut state = self.inner.state.lock().await;
            let ticket = match mode {
                FetchMode::Normal => state.begin_fetch(false),
                FetchMode::Reconnect => match state.fetch_state() {
                    FetchState::Error | FetchState::FetchingMovies => state.begin_fetch(true),
                    _ => None,
                },
            };
            match ticket {
                Some(ticket) => ticket,
                None => {
                    debug!("Fetch request ignored in state {}", state.fetch_state());
                    return FetchOutcome::Ignored;
                }
            }
        };

        let mut pending = PendingFetch::new(&self.inner, ticket);
        let result = self.inner.client.fetch_popular_movies(ticket.page).await;

        let mut state = self.inner.state.lock().await;
        pending.disarm();
        match result {
            Err(e) if e.is_superseded() => {
                // Cancelled from outside this list: leave the guard state retryable
                if state.complete_failure(&ticket) {
                    debug!("Page {} request was cancelled externally", ticket.page);
                }
                FetchOutcome::Superseded
            }
            Ok(movies) => match state.complete_success(&ticket, movies) {
                Some(loaded) => {
                    drop(state);
                    info!(
                        "Loaded page {}: {} movies added, {} total",
                        loaded.page, loaded.added, loaded.total
                    );
                    let _ = self.inner.events.send(ListEvent::PopularMoviesResult(Ok(loaded)));
                    FetchOutcome::Completed(Ok(loaded))
                }
                None => FetchOutcome::Superseded,
            },
            Err(e) => {
                if !state.complete_failure(&ticket) {
                    return FetchOutcome::Superseded;
                }
                drop(state);
                warn!("Fetching page {} failed: {}", ticket.page, e);
                let err = e.normalize().unwrap_or(ServerError::General);
                let _ = self.inner.events.send(ListEvent::PopularMoviesResult(Err(err)));
                FetchOutcome::Completed(Err(err))
            }
        }
    }

    /// Download the thumbnail of the movie at `index`
    ///
    /// Returns `true` when the image was stored and `MovieThumbnailReady`
    /// published. Movies without a poster URL, movies that already have an
    /// image, downloads already in flight and failed downloads all return
    /// `false` and publish nothing.
    pub async fn download_thumbnail(&self, index: usize) -> bool {
        let Some(movie) = self.movie_at(index).await else {
            return false;
        };
        if movie.has_poster_image() {
            return false;
        }
        let Some(url) = movie.poster_url.clone() else {
            return false;
        };

        match self.inner.client.download_image(&url).await {
            Ok(Some(image)) => {
                let image = Arc::new(image);
                if !movie.set_poster_image(Arc::clone(&image)) {
                    return false;
                }
                let _ = self.inner.events.send(ListEvent::MovieThumbnailReady {
                    index,
                    movie_id: movie.id,
                    image,
                });
                true
            }
            Ok(None) => false,
            Err(e) => {
                debug!("Thumbnail for movie {} not available: {}", movie.id, e);
                false
            }
        }
    }

    /// Run [`download_thumbnail`](Self::download_thumbnail) in the background
    pub fn spawn_download_thumbnail(&self, index: usize) -> JoinHandle<bool> {
        let this = self.clone();
        self.spawn(async move { this.download_thumbnail(index).await })
    }

    fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        match &self.inner.runtime {
            Some(runtime) => runtime.spawn(future),
            None => tokio::spawn(future),
        }
    }
}

#[cfg(test)]
mod tests;
