//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a library failure.
///
/// ### Operational Errors
/// - [`ErrorKind::RootNotFound`]
/// - [`ErrorKind::NotOpen`]
/// - [`ErrorKind::Validation`]
///
/// ### Dependency Errors
/// - [`ErrorKind::Catalog`]
/// - [`ErrorKind::Extract`]
/// - [`ErrorKind::Render`]
/// - [`ErrorKind::Task`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A read or write through [`pagekeep_catalog::Catalog`] failed.
    #[display("catalog operation failed")]
    Catalog,
    /// The document could not be opened to read its metadata.
    #[display("could not read document: {}", _0.display())]
    Extract(#[error(not(source))] PathBuf),
    /// Rendering a page for display failed.
    #[display("could not render page")]
    Render,
    /// A scan root is missing or is not a directory.
    #[display("scan root is not a directory: {}", _0.display())]
    RootNotFound(#[error(not(source))] PathBuf),
    /// A reading session operation was attempted with no document open.
    #[display("no document is open")]
    NotOpen,
    /// The requested edit is invalid; nothing was written.
    #[display("invalid edit: {_0}")]
    Validation(#[error(not(source))] &'static str),
    /// A blocking worker panicked or was cancelled.
    #[display("background task failed")]
    Task,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Catalog | ErrorKind::Task)
    }
}
