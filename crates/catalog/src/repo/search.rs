use super::{Catalog, like_pattern};
use crate::error::{ErrorKind, Result};
use crate::models::{Document, DocumentFilter, DocumentRow, DocumentSort, Statistics};
use exn::ResultExt;
use sqlx::{QueryBuilder, Sqlite};

fn non_empty(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|v| !v.is_empty())
}

/// Translate a filter into SQL. Dimensions are ANDed; each tag and each
/// metadata pair is its own EXISTS clause, so all of them must match.
///
/// Text and name matching ignore case for ASCII letters only, following
/// SQLite's `LIKE` and the `NOCASE` name columns. `DUNE` finds `Dune`;
/// `émile` does not find `Émile`.
fn build_search(filter: &DocumentFilter) -> QueryBuilder<'static, Sqlite> {
    let mut query = QueryBuilder::new("SELECT d.* FROM documents d WHERE 1 = 1");
    if let Some(text) = filter.text.as_deref().and_then(non_empty) {
        let pattern = like_pattern(text);
        query
            .push(" AND (d.title LIKE ")
            .push_bind(pattern.clone())
            .push(r" ESCAPE '\' OR d.author LIKE ")
            .push_bind(pattern.clone())
            .push(r" ESCAPE '\' OR d.publisher LIKE ")
            .push_bind(pattern)
            .push(r" ESCAPE '\')");
    }
    for tag in filter.tags.iter().filter_map(|tag| non_empty(tag)) {
        query
            .push(
                " AND EXISTS (SELECT 1 FROM document_tags dt INNER JOIN tags t ON t.id = dt.tag_id \
                 WHERE dt.document_id = d.id AND t.name = ",
            )
            .push_bind(tag.to_string())
            .push(")");
    }
    if let Some(series) = filter.series.as_deref().and_then(non_empty) {
        query
            .push(
                " AND EXISTS (SELECT 1 FROM series_documents sd INNER JOIN series s ON s.id = sd.series_id \
                 WHERE sd.document_id = d.id AND s.name = ",
            )
            .push_bind(series.to_string())
            .push(")");
    }
    if let Some(category) = filter.category.as_deref().and_then(non_empty) {
        query
            .push(
                " AND EXISTS (SELECT 1 FROM series_documents sd INNER JOIN series s ON s.id = sd.series_id \
                 INNER JOIN categories c ON c.id = s.category_id WHERE sd.document_id = d.id AND c.name = ",
            )
            .push_bind(category.to_string())
            .push(")");
    }
    if let Some(status) = filter.status {
        query.push(" AND d.reading_status = ").push_bind(status.as_str());
    }
    if filter.favorites_only {
        query.push(" AND d.favorite = 1");
    }
    for pair in &filter.metadata {
        let Some(key) = non_empty(&pair.key) else {
            continue;
        };
        query
            .push(" AND EXISTS (SELECT 1 FROM document_metadata m WHERE m.document_id = d.id AND m.key = ")
            .push_bind(key.to_string())
            .push(" AND m.value LIKE ")
            .push_bind(like_pattern(&pair.value))
            .push(r" ESCAPE '\')");
    }
    query
}

impl Catalog {
    /// Documents matching `filter`, ordered by `sort`.
    pub async fn search_documents(&self, filter: &DocumentFilter, sort: DocumentSort) -> Result<Vec<Document>> {
        let mut query = build_search(filter);
        let rows: Vec<DocumentRow> =
            query.build_query_as().fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)?;
        let mut documents = rows.into_iter().map(Document::try_from).collect::<Result<Vec<_>>>()?;
        sort.sort(&mut documents);
        tracing::debug!(matches = documents.len(), "Document search");
        Ok(documents)
    }

    pub async fn statistics(&self) -> Result<Statistics> {
        sqlx::query_as(include_str!("../../queries/statistics.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }
}
