//! Error types for Movie Feed
//!
//! Request, transport and decode failures are kept apart inside the crate so
//! they can be logged with full detail where they happen. Before a failure
//! reaches presentation code it is normalized to [`ServerError`].

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building an API request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiRequestError {
    /// Endpoint URL could not be constructed
    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Reserved for search queries that cannot be encoded
    #[error("Invalid search query: {query}")]
    InvalidSearchQuery { query: String },
}

/// Normalized server-side failure handed to presentation code
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerError {
    /// Any transport failure or unexpected status
    #[error("Something went wrong talking to the movie service")]
    General,

    /// Request did not finish within the configured timeout
    #[error("The movie service timed out")]
    Timeout,

    /// Service responded with HTTP 503
    #[error("The movie service is currently unavailable")]
    ServiceDown,

    /// Feed has no further pages
    #[error("No more results available")]
    NoMoreResults,

    /// Image bytes could not be fetched or decoded
    #[error("Image download failed")]
    ImageDownloadFailure,
}

/// Payload did not match the expected schema
#[derive(Error, Debug)]
pub enum ParseError {
    /// Structurally invalid JSON, missing required field or wrong type
    #[error("Response has an invalid format")]
    InvalidFormat(#[source] serde_json::Error),
}

/// Errors returned by the HTTP client
#[derive(Error, Debug)]
pub enum ClientError {
    /// Request could not be built
    #[error(transparent)]
    Request(#[from] ApiRequestError),

    /// Transport failure or non-200 status
    #[error(transparent)]
    Server(#[from] ServerError),

    /// Response body could not be decoded
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A newer request for the same operation replaced this one
    #[error("Request superseded by a newer request for the same operation")]
    Superseded,
}

impl ClientError {
    /// Map to the presentation taxonomy
    ///
    /// Returns `None` for superseded requests, whose results must never be
    /// delivered.
    pub fn normalize(&self) -> Option<ServerError> {
        match self {
            ClientError::Server(err) => Some(*err),
            ClientError::Request(_) | ClientError::Parse(_) => Some(ServerError::General),
            ClientError::Superseded => None,
        }
    }

    /// True when the request was replaced by a newer one
    pub fn is_superseded(&self) -> bool {
        matches!(self, ClientError::Superseded)
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be rendered as TOML
    #[error("Failed to serialize configuration")]
    Serialize(#[from] toml::ser::Error),

    /// Missing required configuration field
    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Could not determine where configuration lives
    #[error("Could not determine user config directory")]
    NoConfigDir,

    /// I/O error reading or writing configuration
    #[error("Configuration I/O error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP client error
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Client(ClientError::Server(
                ServerError::General
                | ServerError::Timeout
                | ServerError::ServiceDown
                | ServerError::ImageDownloadFailure,
            )) => true,
            AppError::Client(ClientError::Parse(_)) => true,
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Client(ClientError::Request(_)) => "request",
            AppError::Client(ClientError::Server(_)) => "server",
            AppError::Client(ClientError::Parse(_)) => "parse",
            AppError::Client(ClientError::Superseded) => "superseded",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// HTTP client result type alias
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl From<ServerError> for AppError {
    fn from(err: ServerError) -> Self {
        AppError::Client(ClientError::Server(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_json() -> serde_json::Error {
        serde_json::from_str::<serde_json::Value>("{").unwrap_err()
    }

    #[test]
    fn test_normalize_hides_root_cause() {
        let parse = ClientError::Parse(ParseError::InvalidFormat(invalid_json()));
        assert_eq!(parse.normalize(), Some(ServerError::General));

        let request = ClientError::Request(ApiRequestError::InvalidUrl {
            url: "::".to_string(),
            reason: "relative URL without a base".to_string(),
        });
        assert_eq!(request.normalize(), Some(ServerError::General));

        let timeout = ClientError::Server(ServerError::Timeout);
        assert_eq!(timeout.normalize(), Some(ServerError::Timeout));
    }

    #[test]
    fn test_superseded_is_never_delivered() {
        let err = ClientError::Superseded;
        assert!(err.is_superseded());
        assert_eq!(err.normalize(), None);
    }

    #[test]
    fn test_error_categories() {
        let err = AppError::from(ServerError::ServiceDown);
        assert_eq!(err.category(), "server");
        assert!(err.is_recoverable());

        let err = AppError::Config(ConfigError::MissingField {
            field: "api.access_token".to_string(),
        });
        assert_eq!(err.category(), "config");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_parse_error_wraps_source() {
        use std::error::Error as _;
        let err = ParseError::InvalidFormat(invalid_json());
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "Response has an invalid format");
    }
}
