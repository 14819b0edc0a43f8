//! Reading-progress state machine.
//!
//! Status is a pure function of the previous status and the page position,
//! with one exception to "pure": [`ReadingStatus::Completed`] is sticky, so
//! going back to the cover of a finished book keeps it finished. Explicit
//! overrides go through [`Catalog::set_reading_status`] instead.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use pagekeep_catalog::{Catalog, ReadingStatus};
use time::UtcDateTime;

/// Derive the status after moving to `page` (zero-based).
///
/// Reaching the last page completes the book. With a `page_count` of zero
/// every page past the first counts as the last.
pub fn next(status: ReadingStatus, page: u32, page_count: u32) -> ReadingStatus {
    if status == ReadingStatus::Completed {
        ReadingStatus::Completed
    } else if page == 0 {
        ReadingStatus::Unread
    } else if page >= page_count.saturating_sub(1) {
        ReadingStatus::Completed
    } else {
        ReadingStatus::Reading
    }
}

/// The outcome of a page move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub page: u32,
    pub status: ReadingStatus,
    /// Whether the last-read timestamp should be refreshed.
    pub touch_last_read: bool,
}

impl Transition {
    pub fn compute(status: ReadingStatus, page: u32, page_count: u32) -> Self {
        let status = next(status, page, page_count);
        let touch_last_read = match status {
            ReadingStatus::Reading => true,
            ReadingStatus::Completed => page > 0,
            ReadingStatus::Unread => false,
        };
        Self { page, status, touch_last_read }
    }
}

/// Move document `id` to `page` and persist position, status and (when the
/// transition calls for it) the last-read time.
///
/// Pages beyond the end of a document with a known length are clamped to
/// its last page.
pub async fn record_progress(catalog: &Catalog, id: i64, page: u32) -> Result<Transition> {
    let document = catalog.require_document(id).await.or_raise(|| ErrorKind::Catalog)?;
    let page = match document.page_count {
        0 => page,
        count => page.min(count - 1),
    };
    let transition = Transition::compute(document.status, page, document.page_count);
    let last_read = transition.touch_last_read.then(UtcDateTime::now);
    catalog
        .update_progress(id, transition.page, transition.status, last_read)
        .await
        .or_raise(|| ErrorKind::Catalog)?;
    tracing::debug!(id, page, status = %transition.status, "Recorded reading progress");
    Ok(transition)
}
