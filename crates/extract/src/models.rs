use time::Date;

/// Series membership guessed from a filename, e.g. "Saga 3" → ("Saga", 3).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesHint {
    pub name: String,
    pub volume: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Embedded title, or the filename without extension.
    pub title: String,
    pub author: Option<String>,
    /// Publication date taken from the embedded creation date.
    pub published: Option<Date>,
    /// Zero when the page count is unknown.
    pub page_count: u32,
    /// Deduplicated keywords, in document order.
    pub tags: Vec<String>,
    /// Only ever set when the document carries no embedded title.
    pub series: Option<SeriesHint>,
}
