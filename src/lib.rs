//! Movie Feed Library
//!
//! A Rust library for browsing the popular-movies feed of a movie metadata
//! API. Provides paginated list fetching with single-flight requests,
//! de-duplicated poster downloads and connectivity-aware retries.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
