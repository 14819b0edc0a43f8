//! Opening the catalog's SQLite file.

use exn::ResultExt;
use sqlx::SqliteConnection;
use sqlx::pool::PoolConnectionMetadata;
use sqlx::sqlite::{
    SqliteAutoVacuum, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::time::Duration;
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// Catalog schema, compiled in from `migrations/`.
static SCHEMA: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
// One scan writes while the reader UI queries; a handful is plenty.
const MAX_CONNECTIONS: u32 = 4;
const BUSY_TIMEOUT: Duration = Duration::from_millis(1500);

/// Handle on the library catalog database.
///
/// The catalog is the source of truth for everything that is not in the
/// documents themselves (tags, series, ratings, reading progress), so unlike
/// a cache it cannot be rebuilt from a rescan.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    async fn open(options: SqliteConnectOptions, max: Option<u32>) -> Result<Self> {
        let mut pool_options = SqlitePoolOptions::new();
        if max.is_some() {
            // A recycled in-memory connection would take the data with it.
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }
        let pool = pool_options
            .after_connect(|conn, meta| Box::pin(async move { Self::tune_connection(conn, meta).await }))
            .max_connections(max.unwrap_or(MAX_CONNECTIONS))
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Open the library catalog at `path`, creating the file and its parent
    /// directory on first use and bringing the schema up to date.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Database)?;
        }
        tracing::debug!(path = %path.display(), "Opening catalog");
        Self::open(Self::options().filename(path).create_if_missing(true), None).await
    }

    /// A throwaway catalog that lives as long as the returned handle.
    /// Library tests build on it, so it is public.
    pub async fn connect_in_memory() -> Result<Self> {
        // Every connection to ":memory:" is a separate database.
        Self::open(Self::options().filename(":memory:"), Some(1)).await
    }

    fn options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .journal_mode(SqliteJournalMode::Wal)
            // Cascades and SET NULL detachment depend on this.
            .foreign_keys(true)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT)
            .auto_vacuum(SqliteAutoVacuum::None)
    }

    /// Settings with no `SqliteConnectOptions` setter, run on each new
    /// pooled connection.
    async fn tune_connection(conn: &mut SqliteConnection, _meta: PoolConnectionMetadata) -> sqlx::Result<()> {
        sqlx::query(
            r#"
                PRAGMA wal_autocheckpoint = 800;
                PRAGMA cache_size = -8192;
                PRAGMA temp_store = MEMORY;
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    #[instrument("migrating catalog schema", skip(self))]
    async fn migrate(&self) -> Result<()> {
        SCHEMA.run(&self.pool).await.or_raise(|| ErrorKind::Migration)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Optimize and shut the catalog. Waits for in-flight queries.
    pub async fn close(&self) {
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Catalog, NewDocument};

    #[tokio::test]
    async fn test_schema_is_current() {
        let db = Database::connect_in_memory().await.unwrap();
        db.migrate().await.unwrap();
        let sql = "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?";
        for table in ["documents", "series", "series_documents", "tags", "document_tags", "bookmarks"] {
            let found: i64 = sqlx::query_scalar(sql)
                .bind(table)
                .fetch_one(db.pool())
                .await
                .unwrap();
            assert_eq!(found, 1, "missing table {table}");
        }
        db.close().await;
    }

    #[tokio::test]
    async fn test_connection_settings() {
        let db = Database::connect_in_memory().await.unwrap();
        let foreign_keys: i64 = sqlx::query_scalar("PRAGMA foreign_keys").fetch_one(db.pool()).await.unwrap();
        assert_eq!(foreign_keys, 1);
        let checkpoint: i64 = sqlx::query_scalar("PRAGMA wal_autocheckpoint").fetch_one(db.pool()).await.unwrap();
        assert_eq!(checkpoint, 800);
        db.close().await;
    }

    #[tokio::test]
    async fn test_catalog_file_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state/catalog.db");

        let db = Database::connect(&path).await.unwrap();
        let id = Catalog::from(&db).insert_document(&NewDocument::new("Kept", "/library/Kept.pdf")).await.unwrap().id;
        db.close().await;
        assert!(path.is_file());

        let db = Database::connect(&path).await.unwrap();
        let document = Catalog::from(&db).require_document(id).await.unwrap();
        assert_eq!(document.title, "Kept");
        db.close().await;
    }
}
