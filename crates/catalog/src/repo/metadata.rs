use super::{Catalog, link_error};
use crate::error::{ErrorKind, Result};
use crate::models::Owner;
use exn::ResultExt;

impl Owner {
    fn table(&self) -> &'static str {
        match self {
            Owner::Document(_) => "document_metadata",
            Owner::Series(_) => "series_metadata",
        }
    }

    fn column(&self) -> &'static str {
        match self {
            Owner::Document(_) => "document_id",
            Owner::Series(_) => "series_id",
        }
    }

    fn id(&self) -> i64 {
        match self {
            Owner::Document(id) | Owner::Series(id) => *id,
        }
    }

    fn entity(&self) -> &'static str {
        match self {
            Owner::Document(_) => "document",
            Owner::Series(_) => "series",
        }
    }
}

impl Catalog {
    /// Set (insert or overwrite) one custom attribute.
    pub async fn set_metadata(&self, owner: Owner, key: &str, value: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            exn::bail!(ErrorKind::Validation("metadata key must not be empty"));
        }
        let sql = format!(
            "INSERT INTO {table} ({column}, key, value) VALUES (?, ?, ?) \
             ON CONFLICT ({column}, key) DO UPDATE SET value = excluded.value",
            table = owner.table(),
            column = owner.column(),
        );
        sqlx::query(&sql)
            .bind(owner.id())
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(|e| link_error(e, || ErrorKind::NotFound { entity: owner.entity(), id: owner.id() }))?;
        Ok(())
    }

    pub async fn get_metadata(&self, owner: Owner, key: &str) -> Result<Option<String>> {
        let sql = format!("SELECT value FROM {} WHERE {} = ? AND key = ?", owner.table(), owner.column());
        sqlx::query_scalar(&sql)
            .bind(owner.id())
            .bind(key.trim())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    pub async fn remove_metadata(&self, owner: Owner, key: &str) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE {} = ? AND key = ?", owner.table(), owner.column());
        let result = sqlx::query(&sql)
            .bind(owner.id())
            .bind(key.trim())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// All attributes of `owner` as `(key, value)`, ordered by key.
    pub async fn list_metadata(&self, owner: Owner) -> Result<Vec<(String, String)>> {
        let sql = format!("SELECT key, value FROM {} WHERE {} = ? ORDER BY key", owner.table(), owner.column());
        sqlx::query_as(&sql)
            .bind(owner.id())
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }
}
