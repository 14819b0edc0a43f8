use super::{Document, ReadingStatus};
use crate::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Composable document search. Every populated dimension must match (AND);
/// the free-text needle matches title, author or publisher (OR).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentFilter {
    /// Case-insensitive substring of title, author or publisher.
    pub text: Option<String>,
    /// Tag names; a document must carry all of them.
    pub tags: Vec<String>,
    /// Series name the document must belong to.
    pub series: Option<String>,
    /// Category name of one of the document's series.
    pub category: Option<String>,
    pub status: Option<ReadingStatus>,
    pub favorites_only: bool,
    pub metadata: Vec<MetadataFilter>,
}

impl DocumentFilter {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Exact key, substring value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFilter {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Title,
    Author,
    DateAdded,
    LastRead,
    Rating,
    PageCount,
}

impl SortField {
    pub const ALL: [SortField; 6] =
        [Self::Title, Self::Author, Self::DateAdded, Self::LastRead, Self::Rating, Self::PageCount];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Author => "author",
            Self::DateAdded => "date_added",
            Self::LastRead => "last_read",
            Self::Rating => "rating",
            Self::PageCount => "page_count",
        }
    }
}

impl FromStr for SortField {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| exn::Exn::from(ErrorKind::InvalidData("sort field")))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => exn::bail!(ErrorKind::InvalidData("sort direction")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl DocumentSort {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Missing values (no author, never read, unrated) sort last in either
    /// direction; ties fall back to natural title order.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let primary = match self.field {
            SortField::Title => self.directed(pagekeep_natsort::compare(&a.title, &b.title)),
            SortField::Author => self.optional(a.author.as_deref(), b.author.as_deref(), pagekeep_natsort::compare),
            SortField::DateAdded => self.directed(a.date_added.cmp(&b.date_added)),
            SortField::LastRead => self.optional(a.last_read, b.last_read, |a, b| a.cmp(&b)),
            SortField::Rating => self.optional(a.rating, b.rating, |a, b| a.cmp(&b)),
            SortField::PageCount => self.directed(a.page_count.cmp(&b.page_count)),
        };
        primary
            .then_with(|| pagekeep_natsort::compare(&a.title, &b.title))
            .then_with(|| a.id.cmp(&b.id))
    }

    pub fn sort(&self, documents: &mut [Document]) {
        documents.sort_by(|a, b| self.compare(a, b));
    }

    fn directed(&self, ordering: Ordering) -> Ordering {
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    fn optional<T>(&self, a: Option<T>, b: Option<T>, cmp: impl Fn(T, T) -> Ordering) -> Ordering {
        match (a, b) {
            (Some(a), Some(b)) => self.directed(cmp(a, b)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}
