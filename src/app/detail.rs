//! One-shot detail fetch for a single movie
//!
//! [`MovieDetailFetch`] is bound to one movie for the lifetime of a detail
//! view. Each call to [`MovieDetailFetch::fetch_movie_details`] issues the
//! detail request, replaces the cast and related-title collections on
//! success and publishes exactly one [`DetailEvent`] per completed request.
//! There is no retry state machine; the browse session re-fetches when
//! connectivity comes back.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::client::MovieClient;
use crate::app::models::{CastMember, Movie, MovieId, RelatedMovie};
use crate::app::orchestrator::{DetailEvent, DetailLoaded, FetchOutcome};
use crate::constants::list;
use crate::errors::ServerError;

#[derive(Debug, Default)]
struct DetailState {
    cast_members: Vec<CastMember>,
    related_movies: Vec<RelatedMovie>,
    generation: u64,
    loaded: bool,
}

#[derive(Debug)]
struct Inner {
    movie: Arc<Movie>,
    client: Arc<MovieClient>,
    state: Mutex<DetailState>,
    events: broadcast::Sender<DetailEvent>,
    runtime: Option<Handle>,
}

/// Detail fetch for one movie
#[derive(Debug, Clone)]
pub struct MovieDetailFetch {
    inner: Arc<Inner>,
}

impl MovieDetailFetch {
    pub fn new(movie: Arc<Movie>, client: Arc<MovieClient>) -> Self {
        Self::build(movie, client, None)
    }

    /// Create a detail fetch that spawns background work on `runtime`
    pub fn on_runtime(movie: Arc<Movie>, client: Arc<MovieClient>, runtime: Handle) -> Self {
        Self::build(movie, client, Some(runtime))
    }

    fn build(movie: Arc<Movie>, client: Arc<MovieClient>, runtime: Option<Handle>) -> Self {
        let (events, _) = broadcast::channel(list::EVENT_CHANNEL_CAPACITY);
        let state = DetailState {
            cast_members: movie.cast_members.clone(),
            related_movies: movie.related_movies.clone(),
            ..Default::default()
        };
        Self {
            inner: Arc::new(Inner {
                movie,
                client,
                state: Mutex::new(state),
                events,
                runtime,
            }),
        }
    }

    /// Movie shown by this view, as passed in from the list
    pub fn movie(&self) -> &Arc<Movie> {
        &self.inner.movie
    }

    pub fn movie_id(&self) -> MovieId {
        self.inner.movie.id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DetailEvent> {
        self.inner.events.subscribe()
    }

    pub async fn cast_members(&self) -> Vec<CastMember> {
        self.inner.state.lock().await.cast_members.clone()
    }

    pub async fn related_movies(&self) -> Vec<RelatedMovie> {
        self.inner.state.lock().await.related_movies.clone()
    }

    /// Whether a detail request has succeeded at least once
    pub async fn is_loaded(&self) -> bool {
        self.inner.state.lock().await.loaded
    }

    /// Fetch the movie's detail and replace the cast and related titles
    ///
    /// A newer call supersedes this one; the superseded call publishes
    /// nothing and leaves the collections untouched.
    pub async fn fetch_movie_details(&self) -> FetchOutcome<DetailLoaded> {
        let movie_id = self.movie_id();
        let generation = {
            let mut state = self.inner.state.lock().await;
            state.generation += 1;
            state.generation
        };

        let result = self.inner.client.fetch_movie_details(movie_id).await;

        let mut state = self.inner.state.lock().await;
        if state.generation != generation {
            debug!("Detail request for movie {} was replaced", movie_id);
            return FetchOutcome::Superseded;
        }

        match result {
            Err(e) if e.is_superseded() => FetchOutcome::Superseded,
            Ok(detail) => {
                state.cast_members = detail.cast_members;
                state.related_movies = detail.related_movies;
                state.loaded = true;
                let loaded = DetailLoaded {
                    movie_id,
                    cast_members: state.cast_members.len(),
                    related_movies: state.related_movies.len(),
                };
                drop(state);

                info!(
                    "Loaded detail of movie {}: {} cast, {} related",
                    movie_id, loaded.cast_members, loaded.related_movies
                );
                let _ = self.inner.events.send(DetailEvent::MovieDetailResult(Ok(loaded)));
                FetchOutcome::Completed(Ok(loaded))
            }
            Err(e) => {
                drop(state);
                warn!("Fetching detail of movie {} failed: {}", movie_id, e);
                let err = e.normalize().unwrap_or(ServerError::General);
                let _ = self.inner.events.send(DetailEvent::MovieDetailResult(Err(err)));
                FetchOutcome::Completed(Err(err))
            }
        }
    }

    /// Run [`fetch_movie_details`](Self::fetch_movie_details) in the background
    pub fn spawn_fetch(&self) -> JoinHandle<FetchOutcome<DetailLoaded>> {
        let this = self.clone();
        let future = async move { this.fetch_movie_details().await };
        match &self.inner.runtime {
            Some(runtime) => runtime.spawn(future),
            None => tokio::spawn(future),
        }
    }
}
