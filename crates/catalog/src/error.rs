//! Catalog Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    #[display("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },
    /// A document for this file is already catalogued.
    #[display("document already catalogued: {}", _0.display())]
    DuplicateSource(#[error(not(source))] PathBuf),
    #[display("{entity} name already in use: {name}")]
    DuplicateName { entity: &'static str, name: String },
    /// Rejected before anything was written.
    #[display("invalid input: {_0}")]
    Validation(#[error(not(source))] &'static str),
    /// Stored data could not be converted back into a model.
    #[display("invalid catalog data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // SQLITE_BUSY surfaces as a generic database error.
        matches!(self, Self::Database)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
