use super::{Document, DocumentRow};
use crate::error::Error;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Series {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSeries {
    pub name: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub category_id: Option<i64>,
}

impl NewSeries {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }
}

/// A document as a member of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesEntry {
    pub document: Document,
    pub order: Option<f64>,
}

/// A series a document belongs to, with the document's position in it.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesLink {
    pub series: Series,
    pub order: Option<f64>,
}

/// Reading order within a series: explicit order ascending, unordered
/// documents after all ordered ones, ties by natural title order.
pub fn compare_series_position(a_order: Option<f64>, a_title: &str, b_order: Option<f64>, b_title: &str) -> Ordering {
    let by_order = match (a_order, b_order) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_order.then_with(|| pagekeep_natsort::compare(a_title, b_title))
}

#[derive(sqlx::FromRow)]
pub(crate) struct SeriesEntryRow {
    #[sqlx(flatten)]
    pub(crate) document: DocumentRow,
    pub(crate) series_order: Option<f64>,
}

impl TryFrom<SeriesEntryRow> for SeriesEntry {
    type Error = Error;
    fn try_from(row: SeriesEntryRow) -> Result<Self, Self::Error> {
        Ok(Self { document: row.document.try_into()?, order: row.series_order })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct SeriesLinkRow {
    #[sqlx(flatten)]
    pub(crate) series: Series,
    pub(crate) series_order: Option<f64>,
}

impl From<SeriesLinkRow> for SeriesLink {
    fn from(row: SeriesLinkRow) -> Self {
        Self { series: row.series, order: row.series_order }
    }
}
