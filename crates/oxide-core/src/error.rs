//! Error types for Oxide cache restore.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Key validation errors
    #[error("No cache keys provided")]
    NoKeysProvided,

    #[error("Maximum number of keys is {max}, {provided} provided")]
    TooManyKeys { max: usize, provided: usize },

    #[error("Commas are not allowed in keys (invalid key: {0})")]
    InvalidKey(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Resolution errors
    #[error("Store request failed during {operation}")]
    StoreTransport {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("No cache archive found for the provided keys")]
    CacheNotFound,

    // Download errors
    #[error("All {attempts} download attempts failed")]
    AllRetriesFailed {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("Download failed")]
    Download(#[source] StoreError),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap a store failure raised while looking up a key.
    pub fn transport(operation: &'static str, source: StoreError) -> Self {
        Error::StoreTransport { operation, source }
    }

    /// True when resolution found nothing to restore. Callers usually treat
    /// this as a normal outcome rather than a failure.
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, Error::CacheNotFound)
    }

    /// True for key validation failures.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::NoKeysProvided | Error::TooManyKeys { .. } | Error::InvalidKey(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by an object store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Store request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Store error in {operation}: {message}")]
    Service {
        operation: &'static str,
        message: String,
    },

    #[error("IO error")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn service(operation: &'static str, message: impl Into<String>) -> Self {
        StoreError::Service {
            operation,
            message: message.into(),
        }
    }
}
