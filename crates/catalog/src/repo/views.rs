use super::{Catalog, not_found, validate_name, write_error};
use crate::error::{ErrorKind, Result};
use crate::models::{Document, NewSavedView, SavedView, SavedViewRow};
use exn::ResultExt;

impl Catalog {
    pub async fn create_view(&self, new: &NewSavedView) -> Result<SavedView> {
        let name = validate_name(&new.name)?;
        let filter = serde_json::to_string(&new.filter).or_raise(|| ErrorKind::InvalidData("saved view filter"))?;
        let row: SavedViewRow = sqlx::query_as(include_str!("../../queries/insert_saved_view.sql"))
            .bind(name)
            .bind(&new.view_type)
            .bind(new.sort.field.as_str())
            .bind(new.sort.direction.as_str())
            .bind(filter)
            .bind(new.category_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error(e, || ErrorKind::DuplicateName { entity: "saved view", name: name.to_string() }))?;
        row.try_into()
    }

    pub async fn get_view(&self, id: i64) -> Result<Option<SavedView>> {
        let row: Option<SavedViewRow> = sqlx::query_as("SELECT * FROM saved_views WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(SavedView::try_from).transpose()
    }

    pub async fn update_view(&self, view: &SavedView) -> Result<()> {
        let name = validate_name(&view.name)?;
        let filter = serde_json::to_string(&view.filter).or_raise(|| ErrorKind::InvalidData("saved view filter"))?;
        let result = sqlx::query(include_str!("../../queries/update_saved_view.sql"))
            .bind(name)
            .bind(&view.view_type)
            .bind(view.sort.field.as_str())
            .bind(view.sort.direction.as_str())
            .bind(filter)
            .bind(view.category_id)
            .bind(view.id)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, || ErrorKind::DuplicateName { entity: "saved view", name: name.to_string() }))?;
        if result.rows_affected() == 0 {
            return Err(not_found("saved view", view.id));
        }
        Ok(())
    }

    pub async fn delete_view(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM saved_views WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// All saved views, natural-sorted by name.
    pub async fn list_views(&self) -> Result<Vec<SavedView>> {
        let rows: Vec<SavedViewRow> = sqlx::query_as("SELECT * FROM saved_views")
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let mut views = rows.into_iter().map(SavedView::try_from).collect::<Result<Vec<_>>>()?;
        pagekeep_natsort::sort(&mut views, |view| &view.name);
        Ok(views)
    }

    /// Execute a saved view's filter and sort.
    pub async fn run_saved_view(&self, id: i64) -> Result<Vec<Document>> {
        let view = self.get_view(id).await?.ok_or_else(|| not_found("saved view", id))?;
        self.search_documents(&view.filter, view.sort).await
    }
}
