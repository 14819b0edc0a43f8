use super::{Catalog, not_found, validate_name, write_error};
use crate::error::{ErrorKind, Result};
use crate::models::Tag;
use exn::ResultExt;
use sqlx::SqliteConnection;

impl Catalog {
    pub async fn create_tag(&self, name: &str, color: Option<&str>) -> Result<Tag> {
        let name = validate_name(name)?;
        sqlx::query_as("INSERT INTO tags (name, color) VALUES (?, ?) RETURNING *")
            .bind(name)
            .bind(color)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error(e, || ErrorKind::DuplicateName { entity: "tag", name: name.to_string() }))
    }

    pub async fn get_tag(&self, id: i64) -> Result<Option<Tag>> {
        sqlx::query_as("SELECT * FROM tags WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Case-insensitive lookup by name.
    pub async fn get_tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        sqlx::query_as("SELECT * FROM tags WHERE name = ?")
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    pub async fn get_or_create_tag(&self, name: &str) -> Result<Tag> {
        let name = validate_name(name)?;
        let mut conn = self.pool.acquire().await.or_raise(|| ErrorKind::Database)?;
        let id = Self::ensure_tag(&mut conn, name).await?;
        sqlx::query_as("SELECT * FROM tags WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    pub async fn update_tag(&self, tag: &Tag) -> Result<()> {
        let name = validate_name(&tag.name)?;
        let result = sqlx::query("UPDATE tags SET name = ?, color = ? WHERE id = ?")
            .bind(name)
            .bind(&tag.color)
            .bind(tag.id)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, || ErrorKind::DuplicateName { entity: "tag", name: name.to_string() }))?;
        if result.rows_affected() == 0 {
            return Err(not_found("tag", tag.id));
        }
        Ok(())
    }

    /// Delete a tag; documents carrying it simply lose it.
    pub async fn delete_tag(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// All tags, natural-sorted by name.
    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        let mut tags: Vec<Tag> = sqlx::query_as("SELECT * FROM tags")
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        pagekeep_natsort::sort(&mut tags, |tag| &tag.name);
        Ok(tags)
    }

    pub async fn tags_for_document(&self, document_id: i64) -> Result<Vec<Tag>> {
        let mut tags: Vec<Tag> = sqlx::query_as(
            r#"
                SELECT t.*
                FROM document_tags dt
                    INNER JOIN tags t ON t.id = dt.tag_id
                WHERE dt.document_id = ?
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .or_raise(|| ErrorKind::Database)?;
        pagekeep_natsort::sort(&mut tags, |tag| &tag.name);
        Ok(tags)
    }

    /// Replace the document's tag set with `names`, creating missing tags.
    pub async fn set_document_tags<S: AsRef<str>>(&self, document_id: i64, names: &[S]) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        Self::ensure_document(&mut tx, document_id).await?;
        sqlx::query("DELETE FROM document_tags WHERE document_id = ?")
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Self::link_tags(&mut tx, document_id, names).await?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Add tags to the document, keeping the ones it already has.
    pub async fn add_document_tags<S: AsRef<str>>(&self, document_id: i64, names: &[S]) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        Self::ensure_document(&mut tx, document_id).await?;
        Self::link_tags(&mut tx, document_id, names).await?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    pub(crate) async fn link_tags<S: AsRef<str>>(
        conn: &mut SqliteConnection,
        document_id: i64,
        names: &[S],
    ) -> Result<()> {
        for name in names {
            let Ok(name) = validate_name(name.as_ref()) else {
                continue;
            };
            let tag_id = Self::ensure_tag(conn, name).await?;
            sqlx::query("INSERT OR IGNORE INTO document_tags (document_id, tag_id) VALUES (?, ?)")
                .bind(document_id)
                .bind(tag_id)
                .execute(&mut *conn)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        Ok(())
    }

    /// Find-or-insert a tag by (case-insensitive) name, returning its id.
    async fn ensure_tag(conn: &mut SqliteConnection, name: &str) -> Result<i64> {
        sqlx::query("INSERT INTO tags (name) VALUES (?) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        sqlx::query_scalar("SELECT id FROM tags WHERE name = ?")
            .bind(name)
            .fetch_one(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    pub(crate) async fn ensure_document(conn: &mut SqliteConnection, document_id: i64) -> Result<()> {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE id = ?")
            .bind(document_id)
            .fetch_one(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if exists == 0 {
            return Err(not_found("document", document_id));
        }
        Ok(())
    }
}
