//! Centralized error handling for the OTT core engine
//!
//! This module provides the error types shared across the engine layers and
//! the result aliases the rest of the crate builds on.
//!
//! # Error Categories
//!
//! - **Catalog Errors**: remote catalog/manifest retrieval and decoding
//! - **Storage Errors**: the persisted watch-progress log
//! - **Configuration Errors**: invalid or incomplete configuration
//!
//! Malformed *content* is deliberately not an error category: a catalog
//! document with missing or oddly shaped fields degrades to empty
//! collections during normalization rather than failing the load.

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for catalog retrieval Results
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Convenience type alias for progress-log storage Results
pub type StorageResult<T> = Result<T, StorageError>;
