//! Error types for the search library.

use thiserror::Error;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during search operations.
///
/// Only a failure to fetch the first result page reaches the caller of
/// [`Search::search`](crate::Search::search); per-item problems (bad
/// encoding, containers without a title, unresolvable redirects) are
/// absorbed and merely shrink the result set.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Every fetch attempt for a URL failed.
    #[error("Network error fetching {url} after {attempts} attempts: {cause}")]
    Network {
        /// URL that could not be fetched.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// Last underlying failure.
        cause: String,
    },

    /// HTTP client error.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to compile an extraction rule.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Invalid query.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// URL parsing error.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl SearchError {
    /// Returns true if this error means the network fetch was exhausted.
    pub fn is_network(&self) -> bool {
        matches!(self, SearchError::Network { .. })
    }
}
