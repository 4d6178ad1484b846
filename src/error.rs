//! Error types for the search router

use thiserror::Error;

/// Result type alias for router operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Comprehensive error types for search and configuration operations
#[derive(Error, Debug, Clone)]
pub enum SearchError {
    /// Provider answered with a non-success status
    #[error("HTTP request failed: {message}")]
    HttpError {
        message: String,
        status_code: Option<u16>,
        response_body: Option<String>,
    },

    /// Connection, DNS or TLS failure before any status was received
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request exceeded the per-provider timeout
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Invalid input parameters, including unknown provider or source ids
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be read or written
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Provider response could not be parsed
    #[error("Parsing error: {0}")]
    ParseError(String),

    /// Provider has no API key configured
    #[error("{0} missing api key")]
    MissingApiKey(String),

    /// The resolved chain has no candidates
    #[error("no primary/fallback {0} configured")]
    EmptyChain(&'static str),

    /// Every candidate in the chain was skipped or failed
    #[error("all {scope} failed: {}", .attempts.join(" | "))]
    Exhausted {
        scope: &'static str,
        attempts: Vec<String>,
    },
}

impl SearchError {
    /// HTTP status code carried by the error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            SearchError::HttpError { status_code, .. } => *status_code,
            _ => None,
        }
    }

    /// True for failures that happened below the HTTP layer
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            SearchError::NetworkError(_) | SearchError::Timeout { .. }
        )
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            SearchError::Timeout {
                timeout_ms: crate::utils::http::DEFAULT_TIMEOUT_MS,
            }
        } else if error.is_status() {
            let status_code = error.status().map(|s| s.as_u16());
            SearchError::HttpError {
                message: error.to_string(),
                status_code,
                response_body: None,
            }
        } else if error.is_connect() || error.is_request() {
            SearchError::NetworkError(error.to_string())
        } else if error.is_decode() {
            SearchError::ParseError(error.to_string())
        } else {
            SearchError::NetworkError(error.to_string())
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(error: serde_json::Error) -> Self {
        SearchError::ParseError(format!("JSON parsing failed: {error}"))
    }
}

impl From<url::ParseError> for SearchError {
    fn from(error: url::ParseError) -> Self {
        SearchError::InvalidInput(format!("Invalid URL: {error}"))
    }
}

impl From<std::io::Error> for SearchError {
    fn from(error: std::io::Error) -> Self {
        SearchError::ConfigError(format!("IO error: {error}"))
    }
}
