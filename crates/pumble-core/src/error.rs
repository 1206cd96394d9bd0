//! Error types for the core library.

use thiserror::Error;

/// Core library error type.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The config file or environment could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// No API key was supplied through config or environment.
    #[error("Pumble API key not configured. Set PUMBLE_API_KEY or api.api_key in the config file.")]
    MissingApiKey,

    /// A path could not be resolved or expanded.
    #[error("path error: {0}")]
    Path(String),

    /// An I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The request never produced a response (connect, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The API answered with a non-success status.
    #[error("{operation} failed: {status} - {body}")]
    Transport {
        /// Human-readable name of the failed call, e.g. `list messages`.
        operation: String,
        /// HTTP status code.
        status: u16,
        /// Raw response body text.
        body: String,
    },

    /// Pagination hit the configured page cap while the API still reported more pages.
    #[error("pagination stopped after {pages} pages; the API still reports more")]
    PageLimitExceeded {
        /// Number of pages fetched before giving up.
        pages: usize,
    },

}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl CoreError {
    /// HTTP status of a failed API call, if this error carries one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;
