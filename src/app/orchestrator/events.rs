//! Events published to presentation code

use std::sync::Arc;

use crate::app::models::{MovieId, PosterImage};
use crate::errors::ServerError;

use super::state::PageLoaded;

/// Events of the popular-movies list
#[derive(Debug, Clone)]
pub enum ListEvent {
    /// A page fetch finished
    PopularMoviesResult(Result<PageLoaded, ServerError>),
    /// The movie at `index` received its thumbnail
    MovieThumbnailReady {
        index: usize,
        movie_id: MovieId,
        image: Arc<PosterImage>,
    },
}

/// Summary of a loaded movie detail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailLoaded {
    pub movie_id: MovieId,
    pub cast_members: usize,
    pub related_movies: usize,
}

/// Events of a movie detail view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailEvent {
    MovieDetailResult(Result<DetailLoaded, ServerError>),
}

/// What happened to a fetch request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome<T> {
    /// Another fetch was already running; nothing was requested
    Ignored,
    /// A newer fetch replaced this one; its result was discarded
    Superseded,
    /// The fetch finished and its result was published
    Completed(Result<T, ServerError>),
}

impl<T> FetchOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, FetchOutcome::Completed(_))
    }

    /// The successful payload, if any
    pub fn loaded(self) -> Option<T> {
        match self {
            FetchOutcome::Completed(Ok(value)) => Some(value),
            _ => None,
        }
    }
}
