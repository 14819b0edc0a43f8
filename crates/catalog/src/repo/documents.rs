use super::{Catalog, not_found, write_error};
use crate::error::{ErrorKind, Result};
use crate::models::{Document, DocumentRow, DocumentSort, NewDocument, ReadingStatus, published_on_column};
use exn::ResultExt;
use sqlx::SqliteConnection;
use std::path::Path;
use time::UtcDateTime;

impl Catalog {
    // =========================================================================
    // Insert
    // =========================================================================

    /// Catalogue a new document.
    ///
    /// Fails with [`ErrorKind::DuplicateSource`] if the path is already known;
    /// callers treating re-imports as no-ops should check
    /// [`get_document_by_path`](Self::get_document_by_path) first.
    pub async fn insert_document(&self, new: &NewDocument) -> Result<Document> {
        let mut conn = self.pool.acquire().await.or_raise(|| ErrorKind::Database)?;
        Self::insert_row(&mut conn, new).await
    }

    /// Insert a document with its tags and (optionally) one series link, as
    /// a single transaction: on any failure nothing is stored.
    ///
    /// The series is created if no series has that name.
    pub async fn insert_document_with_links<S: AsRef<str>>(
        &self,
        new: &NewDocument,
        tags: &[S],
        series: Option<(&str, Option<f64>)>,
    ) -> Result<Document> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let document = Self::insert_row(&mut tx, new).await?;
        Self::link_tags(&mut tx, document.id, tags).await?;
        if let Some((name, order)) = series {
            let series_id = Self::ensure_series(&mut tx, name).await?;
            sqlx::query("INSERT INTO series_documents (series_id, document_id, series_order) VALUES (?, ?, ?)")
                .bind(series_id)
                .bind(document.id)
                .bind(order)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(document)
    }

    async fn insert_row(conn: &mut SqliteConnection, new: &NewDocument) -> Result<Document> {
        new.validate()?;
        let path = Self::sqlx_hates_paths(&new.file_path)?;
        let thumbnail = new.thumbnail.as_ref().map(Self::sqlx_hates_paths).transpose()?;
        let row: DocumentRow = sqlx::query_as(include_str!("../../queries/insert_document.sql"))
            .bind(new.title.trim())
            .bind(&new.author)
            .bind(&new.publisher)
            .bind(path)
            .bind(thumbnail)
            .bind(i64::from(new.page_count))
            .bind(new.rating.map(i64::from))
            .bind(&new.comments)
            .bind(new.favorite)
            .bind(new.volume_number.map(i64::from))
            .bind(published_on_column(new.published_on))
            .bind(Self::now())
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| write_error(e, || ErrorKind::DuplicateSource(new.file_path.clone())))?;
        let document = Document::try_from(row)?;
        tracing::debug!(id = document.id, path = %document.file_path.display(), "Document catalogued");
        Ok(document)
    }

    // =========================================================================
    // Get/Fetch
    // =========================================================================

    pub async fn get_document(&self, id: i64) -> Result<Option<Document>> {
        let row: Option<DocumentRow> = sqlx::query_as("SELECT * FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Document::try_from).transpose()
    }

    /// Like [`get_document`](Self::get_document), but missing is an error.
    pub async fn require_document(&self, id: i64) -> Result<Document> {
        self.get_document(id).await?.ok_or_else(|| not_found("document", id))
    }

    /// Look up a document by its exact source path (the duplicate-detection key).
    pub async fn get_document_by_path(&self, path: impl AsRef<Path>) -> Result<Option<Document>> {
        let row: Option<DocumentRow> = sqlx::query_as("SELECT * FROM documents WHERE file_path = ?")
            .bind(Self::sqlx_hates_paths(path)?)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Document::try_from).transpose()
    }

    pub async fn contains_path(&self, path: impl AsRef<Path>) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE file_path = ?")
            .bind(Self::sqlx_hates_paths(path)?)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(count > 0)
    }

    // =========================================================================
    // Listing
    // =========================================================================

    pub async fn list_documents(&self, sort: DocumentSort) -> Result<Vec<Document>> {
        let rows: Vec<DocumentRow> = sqlx::query_as("SELECT * FROM documents")
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let mut documents = rows.into_iter().map(Document::try_from).collect::<Result<Vec<_>>>()?;
        sort.sort(&mut documents);
        Ok(documents)
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Persist every editable field of `document`.
    pub async fn update_document(&self, document: &Document) -> Result<()> {
        document.validate()?;
        if document.page_count > 0 && document.current_page >= document.page_count {
            exn::bail!(ErrorKind::Validation("current page is past the end of the document"));
        }
        let result = sqlx::query(include_str!("../../queries/update_document.sql"))
            .bind(document.title.trim())
            .bind(&document.author)
            .bind(&document.publisher)
            .bind(Self::sqlx_hates_paths(&document.file_path)?)
            .bind(document.thumbnail.as_ref().map(Self::sqlx_hates_paths).transpose()?)
            .bind(i64::from(document.page_count))
            .bind(i64::from(document.current_page))
            .bind(document.rating.map(i64::from))
            .bind(&document.comments)
            .bind(document.favorite)
            .bind(document.status.as_str())
            .bind(document.volume_number.map(i64::from))
            .bind(published_on_column(document.published_on))
            .bind(document.last_read.map(UtcDateTime::unix_timestamp))
            .bind(document.id)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, || ErrorKind::DuplicateSource(document.file_path.clone())))?;
        if result.rows_affected() == 0 {
            return Err(not_found("document", document.id));
        }
        Ok(())
    }

    /// Persist reading position and status. `last_read` is only overwritten
    /// when provided.
    pub async fn update_progress(
        &self,
        id: i64,
        page: u32,
        status: ReadingStatus,
        last_read: Option<UtcDateTime>,
    ) -> Result<()> {
        let result = sqlx::query(include_str!("../../queries/update_progress.sql"))
            .bind(i64::from(page))
            .bind(status.as_str())
            .bind(last_read.map(UtcDateTime::unix_timestamp))
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if result.rows_affected() == 0 {
            return Err(not_found("document", id));
        }
        Ok(())
    }

    /// Explicit status override, bypassing the progress rules.
    pub async fn set_reading_status(&self, id: i64, status: ReadingStatus) -> Result<()> {
        let result = sqlx::query("UPDATE documents SET reading_status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if result.rows_affected() == 0 {
            return Err(not_found("document", id));
        }
        Ok(())
    }

    pub async fn set_thumbnail(&self, id: i64, thumbnail: Option<&Path>) -> Result<()> {
        let result = sqlx::query("UPDATE documents SET thumbnail = ? WHERE id = ?")
            .bind(thumbnail.map(Self::sqlx_hates_paths).transpose()?)
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if result.rows_affected() == 0 {
            return Err(not_found("document", id));
        }
        Ok(())
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Delete a document with its bookmarks, custom metadata and series/tag
    /// links. Returns `false` if it did not exist.
    pub async fn delete_document(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
