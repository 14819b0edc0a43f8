//! The catalog repository.
//!
//! [`Catalog`] is one handle over every entity; its operations are split by
//! entity across the submodules. Every mutation commits on its own, so a
//! crash part-way through a scan keeps the documents already imported. A
//! new document and its tags and series link commit together through
//! [`Catalog::insert_document_with_links`].

mod bookmarks;
mod categories;
mod documents;
mod metadata;
mod search;
mod series;
mod tags;
mod views;

use crate::Database;
use crate::error::{Error, ErrorKind, Result};
use exn::OptionExt;
use sqlx::SqlitePool;
use std::path::Path;
use time::UtcDateTime;

#[derive(Debug, Clone)]
pub struct Catalog {
    pool: SqlitePool,
}

impl From<&Database> for Catalog {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}

impl Catalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn sqlx_hates_paths(path: impl AsRef<Path>) -> Result<String> {
        Ok(path.as_ref().to_str().ok_or_raise(|| ErrorKind::InvalidData("path"))?.to_string())
    }

    fn now() -> i64 {
        UtcDateTime::now().unix_timestamp()
    }
}

/// Classify a failed write: unique violations become `duplicate`, anything
/// else is a plain database error. The sqlx error stays in the tree.
#[track_caller]
pub(crate) fn write_error(err: sqlx::Error, duplicate: impl FnOnce() -> ErrorKind) -> Error {
    let kind = match err.as_database_error() {
        Some(db) if db.is_unique_violation() => duplicate(),
        _ => ErrorKind::Database,
    };
    exn::Exn::from(err).raise(kind)
}

/// Classify a failed association write: a missing parent row becomes
/// `missing`, anything else is a plain database error.
#[track_caller]
pub(crate) fn link_error(err: sqlx::Error, missing: impl FnOnce() -> ErrorKind) -> Error {
    let kind = match err.as_database_error() {
        Some(db) if db.is_foreign_key_violation() => missing(),
        _ => ErrorKind::Database,
    };
    exn::Exn::from(err).raise(kind)
}

pub(crate) fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        exn::bail!(ErrorKind::Validation("name must not be empty"));
    }
    Ok(name)
}

pub(crate) fn not_found(entity: &'static str, id: i64) -> Error {
    exn::Exn::from(ErrorKind::NotFound { entity, id })
}

/// Escape `%`, `_` and the escape character itself for `LIKE ... ESCAPE '\'`.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
