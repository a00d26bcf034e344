//! Error types for `stdseek-core`.
//!
//! [`SourceError`] describes a single adapter call going wrong and is only
//! ever inspected by the fallback cascade. [`Error`] is what surfaces to a
//! caller of the engine.
//!
//! Aggregated search and the download cascade fold per-source failures
//! into [`Error::NoResults`] and [`Error::DownloadExhausted`]. The
//! [`Error::SourceUnavailable`] and [`Error::ParseFailure`] variants are for
//! callers driving one adapter directly; [`Error::from_source`] converts.

use std::time::Duration;

use thiserror::Error;

/// Outcome of one failed call against one source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// Network failure or a non-2xx response.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The body arrived but could not be understood.
    #[error("malformed response: {0}")]
    Parse(String),

    /// The source has no way to perform the requested operation.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl SourceError {
    /// True for the failures that should count against a source's health.
    pub fn is_availability_failure(&self) -> bool {
        matches!(self, SourceError::Unavailable(_) | SourceError::Timeout(_))
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("source {source_name} unavailable: {message}")]
    SourceUnavailable { source_name: String, message: String },

    /// Every selected source was tried and none returned a record.
    #[error("no results for {keyword:?}")]
    NoResults { keyword: String },

    #[error("could not parse response from {source_name}: {message}")]
    ParseFailure { source_name: String, message: String },

    #[error("no confident match for {0:?}")]
    IdentifierAmbiguous(String),

    /// Every download strategy failed. `attempts` is the full trail.
    #[error("all download strategies failed for {identifier} ({} attempts)", attempts.len())]
    DownloadExhausted {
        identifier: String,
        attempts: Vec<String>,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Error::Storage(err.to_string())
    }

    /// Lift one source's failure to the engine-level taxonomy.
    pub fn from_source(source_name: &str, err: SourceError) -> Self {
        let source_name = source_name.to_string();
        match err {
            SourceError::Parse(message) => Error::ParseFailure {
                source_name,
                message,
            },
            other => Error::SourceUnavailable {
                source_name,
                message: other.to_string(),
            },
        }
    }

    /// Stable machine-readable code, used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::SourceUnavailable { .. } => "source_unavailable",
            Error::NoResults { .. } => "no_results",
            Error::ParseFailure { .. } => "parse_failure",
            Error::IdentifierAmbiguous(_) => "identifier_ambiguous",
            Error::DownloadExhausted { .. } => "download_exhausted",
            Error::Cancelled => "cancelled",
            Error::Config(_) => "config",
            Error::Storage(_) => "storage",
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
