/// Library-wide counters for the host's summary panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct Statistics {
    pub total_books: i64,
    pub total_series: i64,
    pub total_tags: i64,
    pub unread: i64,
    pub reading: i64,
    pub completed: i64,
    pub favorites: i64,
    pub total_pages: i64,
}
