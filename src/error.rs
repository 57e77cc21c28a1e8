//! Error types for pcs-pushover.

use thiserror::Error;

/// Why a LiveStats fetch failed.
///
/// Exactly three kinds: callers branch on [`FetchError::kind`], never on
/// message text.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The page says PCS is having technical difficulties.
    #[error("{0}")]
    Unavailable(String),

    /// No embedded `var data` blob: race not live yet, wrong URL, or layout change.
    #[error("{0}")]
    DataMissing(String),

    /// Network failure or an unparseable blob.
    #[error("{0}")]
    Transport(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Unavailable,
    DataMissing,
    Transport,
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Unavailable(_) => FetchErrorKind::Unavailable,
            FetchError::DataMissing(_) => FetchErrorKind::DataMissing,
            FetchError::Transport(_) => FetchErrorKind::Transport,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transport(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("notification delivery failed: {0}")]
    Delivery(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
