mod bookmark;
mod category;
mod document;
mod filter;
mod series;
mod stats;
mod status;
mod tag;
mod view;

pub use self::bookmark::Bookmark;
pub(crate) use self::bookmark::BookmarkRow;
pub use self::category::Category;
pub use self::document::{Document, MAX_RATING, NewDocument};
pub(crate) use self::document::{DocumentRow, published_on_column};
pub use self::filter::{DocumentFilter, DocumentSort, MetadataFilter, SortDirection, SortField};
pub use self::series::{NewSeries, Series, SeriesEntry, SeriesLink, compare_series_position};
pub(crate) use self::series::{SeriesEntryRow, SeriesLinkRow};
pub use self::stats::Statistics;
pub use self::status::ReadingStatus;
pub use self::tag::Tag;
pub use self::view::{NewSavedView, SavedView};
pub(crate) use self::view::SavedViewRow;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use time::{Date, UtcDateTime};

/// Owner of a custom metadata row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    Document(i64),
    Series(i64),
}

pub(crate) fn from_timestamp(ts: i64, field: &'static str) -> Result<UtcDateTime> {
    UtcDateTime::from_unix_timestamp(ts).or_raise(|| ErrorKind::InvalidData(field))
}

pub(crate) fn date_to_timestamp(date: Date) -> i64 {
    date.midnight().as_utc().unix_timestamp()
}

pub(crate) fn date_from_timestamp(ts: i64, field: &'static str) -> Result<Date> {
    Ok(from_timestamp(ts, field)?.date())
}
