//! List state machine for the popular-movies feed
//!
//! Holds the fetch state, the accumulated movies and the page cursor. All
//! transitions happen through [`ListState::begin_fetch`] and the two
//! completion methods, which check the fetch ticket so that a result from a
//! superseded fetch never touches the list.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::app::models::Movie;
use crate::constants::api;

/// Fetch state of the list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchState {
    Initialized,
    FetchingMovies,
    LoadedMovies,
    NoResults,
    Error,
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchState::Initialized => "initialized",
            FetchState::FetchingMovies => "fetching movies",
            FetchState::LoadedMovies => "loaded movies",
            FetchState::NoResults => "no results",
            FetchState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Identifies one fetch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub page: u32,
    generation: u64,
}

/// Result of applying a successful page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLoaded {
    /// Page that was requested
    pub page: u32,
    /// Movies appended by this page
    pub added: usize,
    /// Length of the accumulated list afterwards
    pub total: usize,
}

/// Accumulated list, cursor and fetch state
#[derive(Debug)]
pub struct ListState {
    fetch_state: FetchState,
    movies: Vec<Arc<Movie>>,
    page_cursor: u32,
    generation: u64,
}

impl Default for ListState {
    fn default() -> Self {
        Self::new()
    }
}

impl ListState {
    pub fn new() -> Self {
        Self {
            fetch_state: FetchState::Initialized,
            movies: Vec::new(),
            page_cursor: api::FIRST_PAGE,
            generation: 0,
        }
    }

    pub fn fetch_state(&self) -> FetchState {
        self.fetch_state
    }

    /// Next page to request
    pub fn page_cursor(&self) -> u32 {
        self.page_cursor
    }

    pub fn movies(&self) -> &[Arc<Movie>] {
        &self.movies
    }

    pub fn movie_at(&self, index: usize) -> Option<Arc<Movie>> {
        self.movies.get(index).cloned()
    }

    pub fn is_fetching(&self) -> bool {
        self.fetch_state == FetchState::FetchingMovies
    }

    /// Enter `FetchingMovies` for the page at the cursor
    ///
    /// Returns `None` while a fetch is already running, unless `supersede`
    /// is set, in which case the running fetch's ticket is invalidated.
    pub fn begin_fetch(&mut self, supersede: bool) -> Option<FetchTicket> {
        if self.is_fetching() && !supersede {
            return None;
        }
        self.generation += 1;
        self.fetch_state = FetchState::FetchingMovies;
        debug!("Fetching page {} (generation {})", self.page_cursor, self.generation);
        Some(FetchTicket {
            page: self.page_cursor,
            generation: self.generation,
        })
    }

    fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation && self.is_fetching()
    }

    /// Apply a successful page
    ///
    /// Movies are appended and the cursor advances, also for an empty
    /// page. An empty first page moves to `NoResults`; an empty later page
    /// keeps the list loaded. Returns `None` for a stale ticket.
    pub fn complete_success(&mut self, ticket: &FetchTicket, movies: Vec<Movie>) -> Option<PageLoaded> {
        if !self.is_current(ticket) {
            return None;
        }

        let added = movies.len();
        self.movies.extend(movies.into_iter().map(Arc::new));
        self.page_cursor += 1;
        self.fetch_state = if self.movies.is_empty() {
            FetchState::NoResults
        } else {
            FetchState::LoadedMovies
        };

        Some(PageLoaded {
            page: ticket.page,
            added,
            total: self.movies.len(),
        })
    }

    /// Record a failed fetch; the list and cursor are kept
    ///
    /// Returns `false` for a stale ticket.
    pub fn complete_failure(&mut self, ticket: &FetchTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.fetch_state = FetchState::Error;
        true
    }

    /// Whether displaying row `index` should trigger the next page
    pub fn should_prefetch(&self, index: usize, prefetch_distance: usize) -> bool {
        !self.is_fetching()
            && !self.movies.is_empty()
            && self.movies.len().checked_sub(prefetch_distance) == Some(index)
    }
}
