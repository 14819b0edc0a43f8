use super::{Catalog, not_found, validate_name, write_error};
use crate::error::{ErrorKind, Result};
use crate::models::Category;
use exn::ResultExt;

impl Catalog {
    pub async fn create_category(&self, name: &str, description: Option<&str>, display_order: i64) -> Result<Category> {
        let name = validate_name(name)?;
        sqlx::query_as("INSERT INTO categories (name, description, display_order) VALUES (?, ?, ?) RETURNING *")
            .bind(name)
            .bind(description)
            .bind(display_order)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error(e, || ErrorKind::DuplicateName { entity: "category", name: name.to_string() }))
    }

    pub async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        sqlx::query_as("SELECT * FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// New categories are appended after the current last one.
    pub async fn get_or_create_category(&self, name: &str) -> Result<Category> {
        let name = validate_name(name)?;
        sqlx::query(
            r#"
                INSERT INTO categories (name, display_order)
                VALUES (?, (SELECT COALESCE(MAX(display_order) + 1, 0) FROM categories))
                ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(name)
        .execute(&self.pool)
        .await
        .or_raise(|| ErrorKind::Database)?;
        sqlx::query_as("SELECT * FROM categories WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    pub async fn update_category(&self, category: &Category) -> Result<()> {
        let name = validate_name(&category.name)?;
        let result = sqlx::query("UPDATE categories SET name = ?, description = ?, display_order = ? WHERE id = ?")
            .bind(name)
            .bind(&category.description)
            .bind(category.display_order)
            .bind(category.id)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, || ErrorKind::DuplicateName { entity: "category", name: name.to_string() }))?;
        if result.rows_affected() == 0 {
            return Err(not_found("category", category.id));
        }
        Ok(())
    }

    /// Delete a category; series and saved views in it become uncategorised.
    pub async fn delete_category(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// Ordered by `display_order`, then natural name.
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut categories: Vec<Category> = sqlx::query_as("SELECT * FROM categories")
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        categories.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| pagekeep_natsort::compare(&a.name, &b.name))
        });
        Ok(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::catalog;
    use super::*;
    use crate::models::NewSeries;

    #[tokio::test]
    async fn test_list_order() {
        let catalog = catalog().await;
        catalog.create_category("Comics 10", None, 1).await.unwrap();
        catalog.create_category("Comics 9", None, 1).await.unwrap();
        catalog.create_category("Novels", Some("Prose"), 0).await.unwrap();
        let names: Vec<_> = catalog.list_categories().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Novels", "Comics 9", "Comics 10"]);
    }

    #[tokio::test]
    async fn test_get_or_create_appends() {
        let catalog = catalog().await;
        let first = catalog.get_or_create_category("Manga").await.unwrap();
        let second = catalog.get_or_create_category("Essays").await.unwrap();
        assert_eq!(first.display_order, 0);
        assert_eq!(second.display_order, 1);
        assert_eq!(catalog.get_or_create_category("manga").await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_delete_detaches_series() {
        let catalog = catalog().await;
        let category = catalog.create_category("Comics", None, 0).await.unwrap();
        let mut new = NewSeries::new("Saga");
        new.category_id = Some(category.id);
        let series = catalog.create_series(&new).await.unwrap();
        assert!(catalog.delete_category(category.id).await.unwrap());
        let series = catalog.get_series(series.id).await.unwrap().unwrap();
        assert_eq!(series.category_id, None);
    }
}
