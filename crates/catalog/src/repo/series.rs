use super::{Catalog, link_error, not_found, validate_name, write_error};
use crate::error::{ErrorKind, Result};
use crate::models::{
    NewSeries, Series, SeriesEntry, SeriesEntryRow, SeriesLink, SeriesLinkRow, compare_series_position,
};
use exn::ResultExt;
use sqlx::SqliteConnection;

impl Catalog {
    // =========================================================================
    // Series
    // =========================================================================

    pub async fn create_series(&self, new: &NewSeries) -> Result<Series> {
        let name = validate_name(&new.name)?;
        sqlx::query_as(
            r#"
                INSERT INTO series (name, description, author, publisher, category_id)
                VALUES (?, ?, ?, ?, ?)
                RETURNING *
            "#,
        )
        .bind(name)
        .bind(&new.description)
        .bind(&new.author)
        .bind(&new.publisher)
        .bind(new.category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, || ErrorKind::DuplicateName { entity: "series", name: name.to_string() }))
    }

    pub async fn get_series(&self, id: i64) -> Result<Option<Series>> {
        sqlx::query_as("SELECT * FROM series WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Case-insensitive lookup by name.
    pub async fn get_series_by_name(&self, name: &str) -> Result<Option<Series>> {
        sqlx::query_as("SELECT * FROM series WHERE name = ?")
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Id of the series called `name`, created bare if missing.
    pub(crate) async fn ensure_series(conn: &mut SqliteConnection, name: &str) -> Result<i64> {
        let name = validate_name(name)?;
        sqlx::query("INSERT INTO series (name) VALUES (?) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        sqlx::query_scalar("SELECT id FROM series WHERE name = ?")
            .bind(name)
            .fetch_one(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    pub async fn get_or_create_series(&self, name: &str) -> Result<Series> {
        let name = validate_name(name)?;
        sqlx::query("INSERT INTO series (name) VALUES (?) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        sqlx::query_as("SELECT * FROM series WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    pub async fn update_series(&self, series: &Series) -> Result<()> {
        let name = validate_name(&series.name)?;
        let result = sqlx::query(
            r#"
                UPDATE series
                SET name = ?, description = ?, author = ?, publisher = ?, category_id = ?
                WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(&series.description)
        .bind(&series.author)
        .bind(&series.publisher)
        .bind(series.category_id)
        .bind(series.id)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, || ErrorKind::DuplicateName { entity: "series", name: name.to_string() }))?;
        if result.rows_affected() == 0 {
            return Err(not_found("series", series.id));
        }
        Ok(())
    }

    /// Delete a series; its documents stay catalogued, only the membership
    /// (and the series' own metadata) goes.
    pub async fn delete_series(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM series WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// All series, natural-sorted by name.
    pub async fn list_series(&self) -> Result<Vec<Series>> {
        let mut series: Vec<Series> = sqlx::query_as("SELECT * FROM series")
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        pagekeep_natsort::sort(&mut series, |s| &s.name);
        Ok(series)
    }

    // =========================================================================
    // Membership
    // =========================================================================

    /// Documents of a series in reading order: explicit order first, then
    /// unordered ones, ties by natural title.
    pub async fn series_documents(&self, series_id: i64) -> Result<Vec<SeriesEntry>> {
        let rows: Vec<SeriesEntryRow> = sqlx::query_as(include_str!("../../queries/series_documents.sql"))
            .bind(series_id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let mut entries = rows.into_iter().map(SeriesEntry::try_from).collect::<Result<Vec<_>>>()?;
        entries.sort_by(|a, b| compare_series_position(a.order, &a.document.title, b.order, &b.document.title));
        Ok(entries)
    }

    pub async fn series_for_document(&self, document_id: i64) -> Result<Vec<SeriesLink>> {
        let rows: Vec<SeriesLinkRow> = sqlx::query_as(include_str!("../../queries/series_for_document.sql"))
            .bind(document_id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let mut links: Vec<SeriesLink> = rows.into_iter().map(SeriesLink::from).collect();
        pagekeep_natsort::sort(&mut links, |link| &link.series.name);
        Ok(links)
    }

    /// Replace all of the document's series memberships.
    pub async fn set_document_series(&self, document_id: i64, links: &[(i64, Option<f64>)]) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        Self::ensure_document(&mut tx, document_id).await?;
        sqlx::query("DELETE FROM series_documents WHERE document_id = ?")
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        for &(series_id, order) in links {
            let sql = "INSERT OR REPLACE INTO series_documents (series_id, document_id, series_order) VALUES (?, ?, ?)";
            sqlx::query(sql)
                .bind(series_id)
                .bind(document_id)
                .bind(order)
                .execute(&mut *tx)
                .await
                .map_err(|e| link_error(e, || ErrorKind::NotFound { entity: "series", id: series_id }))?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Add (or re-order) one membership, leaving the others alone.
    pub async fn add_document_to_series(&self, document_id: i64, series_id: i64, order: Option<f64>) -> Result<()> {
        sqlx::query(
            r#"
                INSERT INTO series_documents (series_id, document_id, series_order) VALUES (?, ?, ?)
                ON CONFLICT (series_id, document_id) DO UPDATE SET series_order = excluded.series_order
            "#,
        )
        .bind(series_id)
        .bind(document_id)
        .bind(order)
        .execute(&self.pool)
        .await
        .map_err(|e| link_error(e, || ErrorKind::NotFound { entity: "document or series", id: document_id }))?;
        Ok(())
    }

    pub async fn set_series_order(&self, document_id: i64, series_id: i64, order: Option<f64>) -> Result<()> {
        let result = sqlx::query("UPDATE series_documents SET series_order = ? WHERE series_id = ? AND document_id = ?")
            .bind(order)
            .bind(series_id)
            .bind(document_id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if result.rows_affected() == 0 {
            return Err(not_found("series membership", document_id));
        }
        Ok(())
    }

    pub async fn remove_document_from_series(&self, document_id: i64, series_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM series_documents WHERE series_id = ? AND document_id = ?")
            .bind(series_id)
            .bind(document_id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
