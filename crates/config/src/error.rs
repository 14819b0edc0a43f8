//! Config Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// An explicitly requested configuration file does not exist.
    #[display("configuration file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// The file extension is not one of toml, yaml, yml or json.
    #[display("unsupported configuration format: {}", _0.display())]
    UnsupportedFormat(#[error(not(source))] PathBuf),
    /// A source could not be parsed or did not match the schema.
    #[display("could not load configuration")]
    Load,
    /// Values parsed, but are not usable.
    #[display("invalid configuration: {_0}")]
    Invalid(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
