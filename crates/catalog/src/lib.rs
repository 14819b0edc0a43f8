//! SQLite catalog for the document library.
//!
//! # Architecture
//! - **Documents** are keyed by their absolute file path; the path is the
//!   duplicate-detection key for imports.
//! - **Series**, **Tags** and **Categories** are named (case-insensitively
//!   unique) and linked to documents. Deleting one of them detaches its
//!   links and never deletes documents.
//! - **Bookmarks** and **custom metadata** are owned rows that go away with
//!   their owner.
//! - **Saved views** persist a [`DocumentFilter`] and [`DocumentSort`] and can
//!   be executed directly.
//!
//! Ordered listings use natural ordering (`pagekeep-natsort`).

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::models::*;
pub use crate::repo::Catalog;
