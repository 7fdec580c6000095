//! Error type definitions for the OTT core engine

use thiserror::Error;

/// Top-level application error type
///
/// Uses `thiserror` to provide automatic error trait implementations and
/// proper error chaining from the layer-specific error enums.
#[derive(Error, Debug)]
pub enum AppError {
    /// Catalog/manifest retrieval errors
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Watch-progress log storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Catalog and manifest retrieval errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Network-level fetch failure for a single candidate URL
    #[error("Fetch failed: {url} - {message}")]
    Fetch { url: String, message: String },

    /// Non-success HTTP status for a single candidate URL
    #[error("HTTP status {status}: {url}")]
    Status { url: String, status: u16 },

    /// Response body was not valid JSON
    #[error("Malformed document from {url}: {message}")]
    Malformed { url: String, message: String },

    /// Every candidate URL in the fallback chain failed
    ///
    /// This is the only catalog error surfaced to the user; everything above
    /// is recovered internally by trying the next candidate.
    #[error("Catalog unavailable: all candidate URLs failed")]
    Unavailable,
}

/// Watch-progress log storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem read/write failures
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Log serialization failures
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl CatalogError {
    /// Create a fetch error for a candidate URL
    pub fn fetch<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a malformed-document error for a candidate URL
    pub fn malformed<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Malformed {
            url: url.into(),
            message: message.into(),
        }
    }
}
