//! Multi-document edits.
//!
//! One [`BatchEdit`] is applied to each document in turn. A document that
//! fails is recorded in [`BatchResult::failed`] and the rest carry on; only
//! an invalid edit, or failing to prepare the target series, stops the batch
//! before it starts.
//!
//! A series assignment replaces every series link the document had, so each
//! edited document ends up in the target series alone.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use pagekeep_catalog::{
    Catalog, Document, MAX_RATING, ReadingStatus, Series, SeriesLink, compare_series_position,
};
use pagekeep_render::ThumbnailCache;
use std::collections::HashMap;

/// How series positions are assigned when documents are bulk-added to a
/// series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderPolicy {
    /// Keep positions in the target series; new members get none.
    #[default]
    Unchanged,
    /// Sort by each document's current position (unpositioned last), then by
    /// title, and number sequentially. The current position is the one in the
    /// target series for existing members, otherwise the first ordered link
    /// the document has.
    PreserveCurrent,
    /// Sort by title alone and number sequentially.
    ByTitle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesAssignment {
    /// Created if no series has this name.
    pub name: String,
    pub policy: OrderPolicy,
    /// Position given to the first document; the rest follow in steps of 1.
    pub start: f64,
}

impl SeriesAssignment {
    pub fn new(name: impl Into<String>, policy: OrderPolicy) -> Self {
        Self { name: name.into(), policy, start: 1.0 }
    }
}

/// Fields left as `None` (or empty) are not touched. For the text fields,
/// `Some` of a blank string clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchEdit {
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub comments: Option<String>,
    /// `Some(None)` clears the rating.
    pub rating: Option<Option<u8>>,
    pub favorite: Option<bool>,
    /// Explicit override, bypassing the progress rules.
    pub status: Option<ReadingStatus>,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
    pub series: Option<SeriesAssignment>,
}

impl BatchEdit {
    fn validate(&self) -> Result<()> {
        if self.rating.flatten().is_some_and(|rating| rating > MAX_RATING) {
            exn::bail!(ErrorKind::Validation("rating must be between 0 and 5"));
        }
        if let Some(series) = &self.series {
            if series.name.trim().is_empty() {
                exn::bail!(ErrorKind::Validation("series name must not be empty"));
            }
            if !series.start.is_finite() {
                exn::bail!(ErrorKind::Validation("series start must be a finite number"));
            }
        }
        Ok(())
    }

    fn touches_fields(&self) -> bool {
        self.author.is_some()
            || self.publisher.is_some()
            || self.comments.is_some()
            || self.rating.is_some()
            || self.favorite.is_some()
    }

    fn touches_tags(&self) -> bool {
        !self.add_tags.is_empty() || !self.remove_tags.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub success: Vec<i64>,
    pub failed: Vec<i64>,
}

fn blank_to_none(value: &str) -> Option<String> {
    Some(value.trim()).filter(|v| !v.is_empty()).map(String::from)
}

/// `(current ∪ add) − remove`, comparing names case-insensitively and
/// keeping the first spelling seen.
pub fn merge_tags(current: &[String], add: &[String], remove: &[String]) -> Vec<String> {
    let removed = |name: &str| remove.iter().any(|r| r.trim().eq_ignore_ascii_case(name));
    let mut merged: Vec<String> = Vec::new();
    for name in current.iter().chain(add).map(|n| n.trim()).filter(|n| !n.is_empty()) {
        if removed(name) || merged.iter().any(|m| m.eq_ignore_ascii_case(name)) {
            continue;
        }
        merged.push(name.to_string());
    }
    merged
}

/// Position of a document before the batch, for [`OrderPolicy::PreserveCurrent`].
fn prior_order(links: &[SeriesLink], target: i64) -> Option<f64> {
    match links.iter().find(|link| link.series.id == target) {
        Some(link) => link.order,
        None => links.iter().find_map(|link| link.order),
    }
}

/// Series positions for `documents` under `policy`, keyed by document id.
/// `links` holds each document's series links before the batch.
fn plan_order(
    documents: &[Document],
    links: &HashMap<i64, Vec<SeriesLink>>,
    target: i64,
    policy: OrderPolicy,
    start: f64,
) -> HashMap<i64, Option<f64>> {
    let links_of = |document: &Document| links.get(&document.id).map(Vec::as_slice).unwrap_or_default();
    let mut ordered: Vec<&Document> = documents.iter().collect();
    match policy {
        OrderPolicy::Unchanged => {
            return documents
                .iter()
                .map(|d| (d.id, links_of(d).iter().find(|link| link.series.id == target).and_then(|link| link.order)))
                .collect();
        },
        OrderPolicy::PreserveCurrent => {
            let prior = |d: &Document| prior_order(links_of(d), target);
            ordered.sort_by(|a, b| compare_series_position(prior(a), &a.title, prior(b), &b.title))
        },
        OrderPolicy::ByTitle => ordered.sort_by(|a, b| pagekeep_natsort::compare(&a.title, &b.title)),
    }
    ordered.into_iter().zip(0u32..).map(|(document, step)| (document.id, Some(start + f64::from(step)))).collect()
}

async fn apply_one(
    catalog: &Catalog,
    mut document: Document,
    edit: &BatchEdit,
    series: Option<(&Series, Option<f64>)>,
) -> Result<()> {
    if edit.touches_fields() {
        if let Some(author) = &edit.author {
            document.author = blank_to_none(author);
        }
        if let Some(publisher) = &edit.publisher {
            document.publisher = blank_to_none(publisher);
        }
        if let Some(comments) = &edit.comments {
            document.comments = blank_to_none(comments);
        }
        if let Some(rating) = edit.rating {
            document.rating = rating;
        }
        if let Some(favorite) = edit.favorite {
            document.favorite = favorite;
        }
        catalog.update_document(&document).await.or_raise(|| ErrorKind::Catalog)?;
    }
    if let Some(status) = edit.status {
        catalog.set_reading_status(document.id, status).await.or_raise(|| ErrorKind::Catalog)?;
    }
    if edit.touches_tags() {
        let current: Vec<String> = catalog
            .tags_for_document(document.id)
            .await
            .or_raise(|| ErrorKind::Catalog)?
            .into_iter()
            .map(|tag| tag.name)
            .collect();
        let tags = merge_tags(&current, &edit.add_tags, &edit.remove_tags);
        catalog.set_document_tags(document.id, &tags).await.or_raise(|| ErrorKind::Catalog)?;
    }
    if let Some((series, order)) = series {
        catalog.set_document_series(document.id, &[(series.id, order)]).await.or_raise(|| ErrorKind::Catalog)?;
    }
    Ok(())
}

/// Apply `edit` to every document in `ids`.
#[tracing::instrument(skip_all, fields(documents = ids.len()))]
pub async fn apply_batch(catalog: &Catalog, ids: &[i64], edit: &BatchEdit) -> Result<BatchResult> {
    edit.validate()?;
    let mut result = BatchResult::default();
    let mut documents = Vec::with_capacity(ids.len());
    for &id in ids {
        match catalog.require_document(id).await {
            Ok(document) => documents.push(document),
            Err(e) => {
                tracing::warn!(id, error = ?e, "Batch edit skipped a document");
                result.failed.push(id);
            },
        }
    }

    let target = match &edit.series {
        Some(assignment) => {
            let series = catalog.get_or_create_series(&assignment.name).await.or_raise(|| ErrorKind::Catalog)?;
            let mut links = HashMap::with_capacity(documents.len());
            for document in &documents {
                let current = catalog.series_for_document(document.id).await.or_raise(|| ErrorKind::Catalog)?;
                links.insert(document.id, current);
            }
            let orders = plan_order(&documents, &links, series.id, assignment.policy, assignment.start);
            Some((series, orders))
        },
        None => None,
    };

    for document in documents {
        let id = document.id;
        let series = target.as_ref().map(|(series, orders)| (series, orders.get(&id).copied().flatten()));
        match apply_one(catalog, document, edit, series).await {
            Ok(()) => result.success.push(id),
            Err(e) => {
                tracing::warn!(id, error = ?e, "Batch edit failed for document");
                result.failed.push(id);
            },
        }
    }
    tracing::info!(success = result.success.len(), failed = result.failed.len(), "Batch edit applied");
    Ok(result)
}

/// Delete every document in `ids`, dropping their cached covers.
#[tracing::instrument(skip_all, fields(documents = ids.len()))]
pub async fn delete_documents(catalog: &Catalog, thumbnails: Option<&ThumbnailCache>, ids: &[i64]) -> BatchResult {
    let mut result = BatchResult::default();
    for &id in ids {
        let document = match catalog.get_document(id).await {
            Ok(Some(document)) => document,
            Ok(None) => {
                tracing::warn!(id, "Cannot delete missing document");
                result.failed.push(id);
                continue;
            },
            Err(e) => {
                tracing::warn!(id, error = ?e, "Cannot delete document");
                result.failed.push(id);
                continue;
            },
        };
        match catalog.delete_document(id).await {
            Ok(true) => result.success.push(id),
            Ok(false) => {
                result.failed.push(id);
                continue;
            },
            Err(e) => {
                tracing::warn!(id, error = ?e, "Cannot delete document");
                result.failed.push(id);
                continue;
            },
        }
        if let Some(cache) = thumbnails
            && let Err(e) = cache.invalidate(&document.file_path)
        {
            tracing::warn!(id, error = ?e, "Could not remove cached thumbnail");
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagekeep_catalog::{Database, NewDocument, Owner};
    use pagekeep_render::mock::{MockRenderer, write_fake_pdf};
    use rstest::rstest;
    use std::sync::Arc;

    async fn catalog() -> Catalog {
        let db = Database::connect_in_memory().await.unwrap();
        Catalog::from(&db)
    }

    async fn add(catalog: &Catalog, title: &str) -> Document {
        let path = format!("/library/{title}.pdf");
        catalog.insert_document(&NewDocument::new(title, path)).await.unwrap()
    }

    fn names(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[rstest]
    #[case::add_and_remove(&["A", "B"], &["C"], &["B"], &["A", "C"])]
    #[case::case_insensitive(&["SciFi"], &["scifi", "New"], &["NEW"], &["SciFi"])]
    #[case::remove_missing(&["A"], &[], &["Z"], &["A"])]
    #[case::blank_ignored(&[], &[" ", "X "], &[], &["X"])]
    fn test_merge_tags(#[case] current: &[&str], #[case] add: &[&str], #[case] remove: &[&str], #[case] expected: &[&str]) {
        assert_eq!(merge_tags(&names(current), &names(add), &names(remove)), names(expected));
    }

    #[tokio::test]
    async fn test_batch_tags_and_fields() {
        let catalog = catalog().await;
        let doc = add(&catalog, "Book").await;
        catalog.set_document_tags(doc.id, &["A", "B"]).await.unwrap();
        let edit = BatchEdit {
            author: Some("Someone".to_string()),
            rating: Some(Some(4)),
            favorite: Some(true),
            status: Some(ReadingStatus::Completed),
            add_tags: names(&["C"]),
            remove_tags: names(&["B"]),
            ..Default::default()
        };
        let result = apply_batch(&catalog, &[doc.id], &edit).await.unwrap();
        assert_eq!(result, BatchResult { success: vec![doc.id], failed: vec![] });

        let stored = catalog.require_document(doc.id).await.unwrap();
        assert_eq!(stored.author.as_deref(), Some("Someone"));
        assert_eq!(stored.rating, Some(4));
        assert!(stored.favorite);
        assert_eq!(stored.status, ReadingStatus::Completed);
        let tags: Vec<_> = catalog.tags_for_document(doc.id).await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(tags, vec!["A", "C"]);
    }

    #[tokio::test]
    async fn test_blank_text_clears() {
        let catalog = catalog().await;
        let mut doc = add(&catalog, "Book").await;
        doc.publisher = Some("Old".to_string());
        catalog.update_document(&doc).await.unwrap();
        let edit = BatchEdit { publisher: Some("  ".to_string()), rating: Some(None), ..Default::default() };
        apply_batch(&catalog, &[doc.id], &edit).await.unwrap();
        let stored = catalog.require_document(doc.id).await.unwrap();
        assert_eq!((stored.publisher, stored.rating), (None, None));
    }

    #[tokio::test]
    async fn test_invalid_edit_writes_nothing() {
        let catalog = catalog().await;
        let doc = add(&catalog, "Book").await;
        let edit = BatchEdit { favorite: Some(true), rating: Some(Some(9)), ..Default::default() };
        let err = apply_batch(&catalog, &[doc.id], &edit).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Validation(_)));
        assert!(!catalog.require_document(doc.id).await.unwrap().favorite);
    }

    #[tokio::test]
    async fn test_failures_do_not_abort_batch() {
        let catalog = catalog().await;
        let a = add(&catalog, "A").await;
        let b = add(&catalog, "B").await;
        let edit = BatchEdit { favorite: Some(true), ..Default::default() };
        let result = apply_batch(&catalog, &[a.id, 999, b.id], &edit).await.unwrap();
        assert_eq!(result.success, vec![a.id, b.id]);
        assert_eq!(result.failed, vec![999]);
    }

    async fn orders(catalog: &Catalog, series: &str) -> Vec<(String, Option<f64>)> {
        let series = catalog.get_series_by_name(series).await.unwrap().unwrap();
        catalog
            .series_documents(series.id)
            .await
            .unwrap()
            .into_iter()
            .map(|entry| (entry.document.title, entry.order))
            .collect()
    }

    #[tokio::test]
    async fn test_preserve_current_into_new_series() {
        let catalog = catalog().await;
        let mut ids = Vec::new();
        for title in ["Part 3", "Part 10", "Part 1", "Part 2", "Part 4"] {
            ids.push(add(&catalog, title).await.id);
        }
        let edit = BatchEdit {
            series: Some(SeriesAssignment::new("Saga", OrderPolicy::PreserveCurrent)),
            ..Default::default()
        };
        let result = apply_batch(&catalog, &ids, &edit).await.unwrap();
        assert_eq!(result.success.len(), 5);
        assert_eq!(
            orders(&catalog, "Saga").await,
            vec![
                ("Part 1".to_string(), Some(1.0)),
                ("Part 2".to_string(), Some(2.0)),
                ("Part 3".to_string(), Some(3.0)),
                ("Part 4".to_string(), Some(4.0)),
                ("Part 10".to_string(), Some(5.0)),
            ]
        );
    }

    #[tokio::test]
    async fn test_preserve_current_keeps_existing_order() {
        let catalog = catalog().await;
        let series = catalog.get_or_create_series("Saga").await.unwrap();
        let z = add(&catalog, "Zeta").await;
        let a = add(&catalog, "Alpha").await;
        let m = add(&catalog, "Mu").await;
        catalog.add_document_to_series(z.id, series.id, Some(0.5)).await.unwrap();
        catalog.add_document_to_series(a.id, series.id, Some(7.0)).await.unwrap();

        let mut assignment = SeriesAssignment::new("saga", OrderPolicy::PreserveCurrent);
        assignment.start = 10.0;
        let edit = BatchEdit { series: Some(assignment), ..Default::default() };
        apply_batch(&catalog, &[a.id, m.id, z.id], &edit).await.unwrap();
        assert_eq!(
            orders(&catalog, "Saga").await,
            vec![
                ("Zeta".to_string(), Some(10.0)),
                ("Alpha".to_string(), Some(11.0)),
                ("Mu".to_string(), Some(12.0)),
            ]
        );
    }

    #[tokio::test]
    async fn test_by_title_ignores_existing_order() {
        let catalog = catalog().await;
        let series = catalog.get_or_create_series("Saga").await.unwrap();
        let b = add(&catalog, "Vol 10").await;
        let a = add(&catalog, "Vol 2").await;
        catalog.add_document_to_series(b.id, series.id, Some(1.0)).await.unwrap();
        catalog.add_document_to_series(a.id, series.id, Some(2.0)).await.unwrap();
        let edit =
            BatchEdit { series: Some(SeriesAssignment::new("Saga", OrderPolicy::ByTitle)), ..Default::default() };
        apply_batch(&catalog, &[b.id, a.id], &edit).await.unwrap();
        assert_eq!(
            orders(&catalog, "Saga").await,
            vec![("Vol 2".to_string(), Some(1.0)), ("Vol 10".to_string(), Some(2.0))]
        );
    }

    #[tokio::test]
    async fn test_unchanged_policy_keeps_positions() {
        let catalog = catalog().await;
        let series = catalog.get_or_create_series("Saga").await.unwrap();
        let member = add(&catalog, "Member").await;
        let newcomer = add(&catalog, "Newcomer").await;
        catalog.add_document_to_series(member.id, series.id, Some(3.0)).await.unwrap();
        let edit =
            BatchEdit { series: Some(SeriesAssignment::new("Saga", OrderPolicy::Unchanged)), ..Default::default() };
        apply_batch(&catalog, &[member.id, newcomer.id], &edit).await.unwrap();
        assert_eq!(
            orders(&catalog, "Saga").await,
            vec![("Member".to_string(), Some(3.0)), ("Newcomer".to_string(), None)]
        );
    }

    #[tokio::test]
    async fn test_reassignment_replaces_links_and_keeps_prior_order() {
        let catalog = catalog().await;
        let old = catalog.get_or_create_series("Old").await.unwrap();
        let mut ids = Vec::new();
        for (title, order) in [("E", 1.0), ("D", 2.0), ("C", 3.0), ("B", 4.0), ("A", 5.0)] {
            let doc = add(&catalog, title).await;
            catalog.add_document_to_series(doc.id, old.id, Some(order)).await.unwrap();
            ids.push(doc.id);
        }
        let edit = BatchEdit {
            series: Some(SeriesAssignment::new("New", OrderPolicy::PreserveCurrent)),
            ..Default::default()
        };
        let result = apply_batch(&catalog, &ids, &edit).await.unwrap();
        assert_eq!(result.success.len(), 5);
        assert_eq!(
            orders(&catalog, "New").await,
            vec![
                ("E".to_string(), Some(1.0)),
                ("D".to_string(), Some(2.0)),
                ("C".to_string(), Some(3.0)),
                ("B".to_string(), Some(4.0)),
                ("A".to_string(), Some(5.0)),
            ]
        );
        assert!(orders(&catalog, "Old").await.is_empty());
        let links: Vec<_> =
            catalog.series_for_document(ids[0]).await.unwrap().into_iter().map(|link| link.series.name).collect();
        assert_eq!(links, vec!["New"]);
    }

    #[tokio::test]
    async fn test_delete_documents() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = MockRenderer::new();
        let cache = ThumbnailCache::new(dir.path().join("thumbs"), Arc::new(renderer));
        let catalog = catalog().await;
        let source = dir.path().join("Book.pdf");
        write_fake_pdf(&source).unwrap();
        let doc = catalog.insert_document(&NewDocument::new("Book", &source)).await.unwrap();
        catalog.add_bookmark(doc.id, 3, "Good bit").await.unwrap();
        catalog.set_metadata(Owner::Document(doc.id), "isbn", "123").await.unwrap();
        let thumbnail = cache.get_or_create(&source, None, None).unwrap();

        let result = delete_documents(&catalog, Some(&cache), &[doc.id, 77]).await;
        assert_eq!(result, BatchResult { success: vec![doc.id], failed: vec![77] });
        assert!(!thumbnail.exists());
        assert!(catalog.get_document(doc.id).await.unwrap().is_none());
        assert!(catalog.list_bookmarks(doc.id).await.unwrap().is_empty());
        assert!(catalog.list_metadata(Owner::Document(doc.id)).await.unwrap().is_empty());
    }
}
