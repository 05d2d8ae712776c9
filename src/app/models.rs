//! Domain records for the movie feed
//!
//! Records are created only by the response decoder. A [`Movie`] is shared
//! by reference (`Arc<Movie>`) between the list, the detail view and any
//! thumbnail download in progress; its poster slot is the one piece of state
//! that changes after decoding, and it can be filled exactly once.

use std::fmt;
use std::sync::{Arc, OnceLock};

use chrono::NaiveDate;
use url::Url;

/// Stable movie identifier, used as the identity key for UI diffing
pub type MovieId = u64;

/// A decoded poster thumbnail
#[derive(Clone, PartialEq, Eq)]
pub struct PosterImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Original encoded bytes as served by the image host
    pub bytes: bytes::Bytes,
}

impl PosterImage {
    /// Validate `bytes` as an image and record its dimensions
    pub fn decode(bytes: bytes::Bytes) -> image::ImageResult<Self> {
        let decoded = image::load_from_memory(&bytes)?;
        Ok(Self {
            width: decoded.width(),
            height: decoded.height(),
            bytes,
        })
    }
}

impl fmt::Debug for PosterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PosterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Cast member of a movie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    /// Absolute profile image URL, absent when the payload has no `profile_path`
    pub image_url: Option<Url>,
}

/// Title related to a movie (the API's "similar" list)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedMovie {
    pub id: MovieId,
    pub title: String,
    pub image_url: Option<Url>,
}

/// A movie as returned by the popular feed or the detail endpoint
#[derive(Debug)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub overview: Option<String>,
    /// Absent when missing from the payload or not in `yyyy-MM-dd` form
    pub release_date: Option<NaiveDate>,
    pub poster_url: Option<Url>,
    pub backdrop_url: Option<Url>,
    pub related_movies: Vec<RelatedMovie>,
    pub cast_members: Vec<CastMember>,
    poster_image: OnceLock<Arc<PosterImage>>,
}

impl Movie {
    /// Build a movie record with an empty poster slot
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: MovieId,
        title: String,
        overview: Option<String>,
        release_date: Option<NaiveDate>,
        poster_url: Option<Url>,
        backdrop_url: Option<Url>,
        related_movies: Vec<RelatedMovie>,
        cast_members: Vec<CastMember>,
    ) -> Self {
        Self {
            id,
            title,
            overview,
            release_date,
            poster_url,
            backdrop_url,
            related_movies,
            cast_members,
            poster_image: OnceLock::new(),
        }
    }

    /// Poster thumbnail, once downloaded
    pub fn poster_image(&self) -> Option<Arc<PosterImage>> {
        self.poster_image.get().cloned()
    }

    /// Whether the thumbnail has been resolved
    pub fn has_poster_image(&self) -> bool {
        self.poster_image.get().is_some()
    }

    /// Store the downloaded thumbnail
    ///
    /// Returns `false` if the slot was already filled; the first image wins.
    pub fn set_poster_image(&self, image: Arc<PosterImage>) -> bool {
        self.poster_image.set(image).is_ok()
    }

    /// Release year, for display
    pub fn release_year(&self) -> Option<i32> {
        use chrono::Datelike;
        self.release_date.map(|date| date.year())
    }
}

impl PartialEq for Movie {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Movie {}
