use super::{DocumentFilter, DocumentSort};
use crate::error::{Error, ErrorKind};
use exn::ResultExt;

/// A persisted filter and sort, shown by the host as a smart collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedView {
    pub id: i64,
    pub name: String,
    /// Presentation hint ("grid", "list", "bookshelf"); not interpreted here.
    pub view_type: String,
    pub sort: DocumentSort,
    pub filter: DocumentFilter,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSavedView {
    pub name: String,
    pub view_type: String,
    pub sort: DocumentSort,
    pub filter: DocumentFilter,
    pub category_id: Option<i64>,
}

#[derive(sqlx::FromRow)]
pub(crate) struct SavedViewRow {
    id: i64,
    name: String,
    view_type: String,
    sort_field: String,
    sort_direction: String,
    filter_query: String,
    category_id: Option<i64>,
}

impl TryFrom<SavedViewRow> for SavedView {
    type Error = Error;
    fn try_from(row: SavedViewRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            view_type: row.view_type,
            sort: DocumentSort::new(row.sort_field.parse()?, row.sort_direction.parse()?),
            filter: serde_json::from_str(&row.filter_query).or_raise(|| ErrorKind::InvalidData("saved view filter"))?,
            category_id: row.category_id,
        })
    }
}
