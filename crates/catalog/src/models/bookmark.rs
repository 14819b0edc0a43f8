use super::from_timestamp;
use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use time::UtcDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    pub id: i64,
    pub document_id: i64,
    pub page: u32,
    pub name: String,
    pub created_at: UtcDateTime,
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookmarkRow {
    id: i64,
    document_id: i64,
    page: i64,
    name: String,
    created_at: i64,
}

impl TryFrom<BookmarkRow> for Bookmark {
    type Error = Error;
    fn try_from(row: BookmarkRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            document_id: row.document_id,
            page: u32::try_from(row.page).or_raise(|| ErrorKind::InvalidData("bookmark page"))?,
            name: row.name,
            created_at: from_timestamp(row.created_at, "bookmark date")?,
        })
    }
}
