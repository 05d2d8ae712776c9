//! Response decoding for the movie metadata API
//!
//! Converts raw JSON bodies into domain records. Wire field names are snake
//! case and map one-to-one onto the record fields. Optional fields may be
//! missing or `null`; nested `credits` and `similar` sub-resources decode to
//! empty sequences when absent. Any structural problem surfaces as
//! [`ParseError::InvalidFormat`] with no partial salvage.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::app::models::{CastMember, Movie, MovieId, RelatedMovie};
use crate::constants::api;
use crate::errors::ParseError;

/// One page of the popular-movies feed
#[derive(Debug)]
pub struct MoviePage {
    pub movies: Vec<Movie>,
    /// Page number echoed by the API, if present
    pub page: Option<u32>,
    pub total_pages: Option<u32>,
    pub total_results: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PopularMoviesEnvelope {
    results: Vec<MovieRecord>,
    page: Option<u32>,
    total_pages: Option<u32>,
    total_results: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct MovieRecord {
    id: MovieId,
    title: String,
    overview: Option<String>,
    release_date: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    similar: Option<SimilarRecord>,
    credits: Option<CreditsRecord>,
}

#[derive(Debug, Deserialize)]
struct SimilarRecord {
    results: Option<Vec<RelatedMovieRecord>>,
}

#[derive(Debug, Deserialize)]
struct CreditsRecord {
    cast: Option<Vec<CastRecord>>,
}

#[derive(Debug, Deserialize)]
struct RelatedMovieRecord {
    id: MovieId,
    title: String,
    poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CastRecord {
    id: u64,
    name: String,
    profile_path: Option<String>,
}

/// Decoder bound to an image host prefix
#[derive(Debug, Clone)]
pub struct ResponseDecoder {
    image_base_url: String,
}

impl Default for ResponseDecoder {
    fn default() -> Self {
        Self::new(api::IMAGE_BASE_URL)
    }
}

impl ResponseDecoder {
    /// Create a decoder that prefixes image paths with `image_base_url`
    pub fn new(image_base_url: impl Into<String>) -> Self {
        Self {
            image_base_url: image_base_url.into(),
        }
    }

    /// Decode a popular-movies response body
    pub fn decode_popular_movies(&self, body: &[u8]) -> Result<MoviePage, ParseError> {
        let envelope: PopularMoviesEnvelope =
            serde_json::from_slice(body).map_err(ParseError::InvalidFormat)?;

        debug!(
            "Decoded popular movies page {:?}/{:?} with {} results",
            envelope.page,
            envelope.total_pages,
            envelope.results.len()
        );

        Ok(MoviePage {
            movies: envelope
                .results
                .into_iter()
                .map(|record| self.movie_from_record(record))
                .collect(),
            page: envelope.page,
            total_pages: envelope.total_pages,
            total_results: envelope.total_results,
        })
    }

    /// Decode a movie-detail response body, including credits and similar titles
    pub fn decode_movie_details(&self, body: &[u8]) -> Result<Movie, ParseError> {
        let record: MovieRecord =
            serde_json::from_slice(body).map_err(ParseError::InvalidFormat)?;
        Ok(self.movie_from_record(record))
    }

    /// Build an absolute image URL from an API-relative path
    ///
    /// The prefix and path are concatenated as-is. A path that does not
    /// produce a valid URL yields `None`.
    pub fn image_url(&self, path: Option<&str>) -> Option<Url> {
        let path = path?;
        Url::parse(&format!("{}{}", self.image_base_url, path)).ok()
    }

    fn movie_from_record(&self, record: MovieRecord) -> Movie {
        let release_date = record.release_date.as_deref().and_then(parse_release_date);

        let cast_members = record
            .credits
            .and_then(|credits| credits.cast)
            .unwrap_or_default()
            .into_iter()
            .map(|cast| CastMember {
                id: cast.id,
                image_url: self.image_url(cast.profile_path.as_deref()),
                name: cast.name,
            })
            .collect();

        let related_movies = record
            .similar
            .and_then(|similar| similar.results)
            .unwrap_or_default()
            .into_iter()
            .map(|related| RelatedMovie {
                id: related.id,
                image_url: self.image_url(related.poster_path.as_deref()),
                title: related.title,
            })
            .collect();

        Movie::new(
            record.id,
            record.title,
            record.overview,
            release_date,
            self.image_url(record.poster_path.as_deref()),
            self.image_url(record.backdrop_path.as_deref()),
            related_movies,
            cast_members,
        )
    }
}

/// Parse a `yyyy-MM-dd` date; anything else is treated as absent
fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, api::RELEASE_DATE_FORMAT).ok()
}
