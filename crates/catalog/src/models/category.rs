#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Listing position; lower first, ties broken by name.
    pub display_order: i64,
}
