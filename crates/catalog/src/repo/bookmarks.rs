use super::{Catalog, link_error, not_found};
use crate::error::{ErrorKind, Result};
use crate::models::{Bookmark, BookmarkRow};
use exn::ResultExt;

impl Catalog {
    pub async fn add_bookmark(&self, document_id: i64, page: u32, name: &str) -> Result<Bookmark> {
        let row: BookmarkRow = sqlx::query_as(
            "INSERT INTO bookmarks (document_id, page, name, created_at) VALUES (?, ?, ?, ?) RETURNING *",
        )
        .bind(document_id)
        .bind(i64::from(page))
        .bind(name.trim())
        .bind(Self::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| link_error(e, || ErrorKind::NotFound { entity: "document", id: document_id }))?;
        row.try_into()
    }

    /// Bookmarks of a document, by page then creation.
    pub async fn list_bookmarks(&self, document_id: i64) -> Result<Vec<Bookmark>> {
        let rows: Vec<BookmarkRow> =
            sqlx::query_as("SELECT * FROM bookmarks WHERE document_id = ? ORDER BY page, created_at, id")
                .bind(document_id)
                .fetch_all(&self.pool)
                .await
                .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Bookmark::try_from).collect()
    }

    pub async fn rename_bookmark(&self, id: i64, name: &str) -> Result<()> {
        let result = sqlx::query("UPDATE bookmarks SET name = ? WHERE id = ?")
            .bind(name.trim())
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if result.rows_affected() == 0 {
            return Err(not_found("bookmark", id));
        }
        Ok(())
    }

    pub async fn delete_bookmark(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
