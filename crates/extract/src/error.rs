//! Extraction Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The document could not be opened or parsed; callers usually fall
    /// back to [`crate::fallback`].
    #[display("could not read metadata from {}", _0.display())]
    Unreadable(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // The file is either parseable or it is not.
        false
    }
}
