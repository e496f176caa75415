use crate::browser::BrowserError;
use crate::http_client::FetchError;

/// Top-level failures of a catalog run
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// Fatal: nothing downstream can run without an authenticated session
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Run cancelled")]
    Cancelled,
}

impl ScrapeError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScrapeError::Authentication(_))
    }
}
