//! Render Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A render error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for render operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The rendering library could not be loaded at all.
    #[display("PDF rendering library is not available")]
    LibraryUnavailable,
    /// The file could not be opened (missing, unreadable).
    #[display("could not open document: {}", _0.display())]
    Open(#[error(not(source))] PathBuf),
    /// The file was readable but is not a valid document.
    #[display("document is corrupt or not a PDF: {}", _0.display())]
    Corrupt(#[error(not(source))] PathBuf),
    #[display("page {index} is out of range (document has {count} pages)")]
    PageOutOfRange { index: u32, count: u32 },
    #[display("failed to render page {_0}")]
    Render(#[error(not(source))] u32),
    #[display("failed to encode thumbnail image")]
    Encode,
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Io | ErrorKind::Open(_))
    }
}
