use super::{date_from_timestamp, date_to_timestamp, from_timestamp, ReadingStatus};
use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use std::path::PathBuf;
use time::{Date, UtcDateTime};

pub const MAX_RATING: u8 = 5;

/// A catalogued file.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub author: Option<String>,
    pub publisher: Option<String>,
    /// Absolute path of the source file; unique across the catalog.
    pub file_path: PathBuf,
    pub thumbnail: Option<PathBuf>,
    /// Zero when unknown.
    pub page_count: u32,
    /// Zero-based.
    pub current_page: u32,
    pub rating: Option<u8>,
    pub comments: Option<String>,
    pub favorite: bool,
    pub status: ReadingStatus,
    pub volume_number: Option<u32>,
    pub published_on: Option<Date>,
    pub date_added: UtcDateTime,
    pub last_read: Option<UtcDateTime>,
}

/// Fields supplied when a document is first catalogued.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewDocument {
    pub title: String,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub file_path: PathBuf,
    pub thumbnail: Option<PathBuf>,
    pub page_count: u32,
    pub rating: Option<u8>,
    pub comments: Option<String>,
    pub favorite: bool,
    pub volume_number: Option<u32>,
    pub published_on: Option<Date>,
}

impl NewDocument {
    pub fn new(title: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self { title: title.into(), file_path: file_path.into(), ..Default::default() }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        validate_rating(self.rating)
    }
}

impl Document {
    pub(crate) fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        validate_rating(self.rating)
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        exn::bail!(ErrorKind::Validation("title must not be empty"));
    }
    Ok(())
}

fn validate_rating(rating: Option<u8>) -> Result<()> {
    if rating.is_some_and(|r| r > MAX_RATING) {
        exn::bail!(ErrorKind::Validation("rating must be between 0 and 5"));
    }
    Ok(())
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct DocumentRow {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) author: Option<String>,
    pub(crate) publisher: Option<String>,
    pub(crate) file_path: String,
    pub(crate) thumbnail: Option<String>,
    pub(crate) page_count: i64,
    pub(crate) current_page: i64,
    pub(crate) rating: Option<i64>,
    pub(crate) comments: Option<String>,
    pub(crate) favorite: bool,
    pub(crate) reading_status: String,
    pub(crate) volume_number: Option<i64>,
    pub(crate) published_on: Option<i64>,
    pub(crate) date_added: i64,
    pub(crate) last_read: Option<i64>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = Error;
    fn try_from(row: DocumentRow) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            author: row.author,
            publisher: row.publisher,
            file_path: PathBuf::from(row.file_path),
            thumbnail: row.thumbnail.map(PathBuf::from),
            page_count: u32::try_from(row.page_count).or_raise(|| ErrorKind::InvalidData("page count"))?,
            current_page: u32::try_from(row.current_page).or_raise(|| ErrorKind::InvalidData("current page"))?,
            rating: row.rating.map(u8::try_from).transpose().or_raise(|| ErrorKind::InvalidData("rating"))?,
            comments: row.comments,
            favorite: row.favorite,
            status: row.reading_status.parse()?,
            volume_number: row
                .volume_number
                .map(u32::try_from)
                .transpose()
                .or_raise(|| ErrorKind::InvalidData("volume number"))?,
            published_on: row.published_on.map(|ts| date_from_timestamp(ts, "publication date")).transpose()?,
            date_added: from_timestamp(row.date_added, "date added")?,
            last_read: row.last_read.map(|ts| from_timestamp(ts, "last read")).transpose()?,
        })
    }
}

pub(crate) fn published_on_column(date: Option<Date>) -> Option<i64> {
    date.map(date_to_timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn row() -> DocumentRow {
        DocumentRow {
            id: 7,
            title: "Saga 3".to_string(),
            author: None,
            publisher: Some("Image".to_string()),
            file_path: "/library/Saga 3.pdf".to_string(),
            thumbnail: None,
            page_count: 180,
            current_page: 12,
            rating: Some(4),
            comments: None,
            favorite: true,
            reading_status: "reading".to_string(),
            volume_number: Some(3),
            published_on: Some(date_to_timestamp(date!(2014 - 03 - 19))),
            date_added: 1_700_000_000,
            last_read: None,
        }
    }

    #[test]
    fn test_row_to_model() {
        let document = Document::try_from(row()).unwrap();
        assert_eq!(document.status, ReadingStatus::Reading);
        assert_eq!(document.file_path, PathBuf::from("/library/Saga 3.pdf"));
        assert_eq!(document.published_on, Some(date!(2014 - 03 - 19)));
        assert_eq!(document.rating, Some(4));
    }

    #[test]
    fn test_row_with_bad_data() {
        let mut bad = row();
        bad.page_count = -1;
        assert_eq!(&*Document::try_from(bad).unwrap_err(), &ErrorKind::InvalidData("page count"));
        let mut bad = row();
        bad.reading_status = "abandoned".to_string();
        assert!(Document::try_from(bad).is_err());
    }

    #[test]
    fn test_validation() {
        assert!(NewDocument::new("  ", "/a.pdf").validate().is_err());
        let mut document = NewDocument::new("Title", "/a.pdf");
        document.rating = Some(6);
        assert!(document.validate().is_err());
        document.rating = Some(5);
        assert!(document.validate().is_ok());
    }
}
