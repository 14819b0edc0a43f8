#[derive(Debug, Clone, PartialEq, Eq, Hash, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    /// Display color, usually `#rrggbb`.
    pub color: Option<String>,
}
