//! The library engine: everything that coordinates more than one of the
//! catalog, the renderer and the thumbnail cache.
//!
//! - [`scan`] imports documents from disk.
//! - [`progress`] derives reading status from page position.
//! - [`session`] is the boundary a viewer talks to while a book is open.
//! - [`batch`] applies one edit to many documents.

pub mod batch;
pub mod error;
pub mod progress;
pub mod scan;
pub mod session;

pub use crate::batch::{BatchEdit, BatchResult, OrderPolicy, SeriesAssignment, apply_batch, delete_documents};
pub use crate::progress::{Transition, next, record_progress};
pub use crate::scan::{ScanOptions, ScanProgress, ScanReport, Scanner};
pub use crate::session::ReadingSession;
