//! Categories repository

use super::{equipment::CATEGORY_EQUIPMENT_SQL, Repository};
use crate::{
    db::{statement::build_update, validate::Payload, AffectedRows, Executor, SqlValue},
    error::{AppResult, LogNeutral},
    models::{
        category::{
            validate_category_data, validate_category_fields, Category, CategoryWithEquipment,
            CATEGORY_COLUMNS,
        },
        equipment::PackagedEquipment,
    },
};

/// Escape LIKE wildcards so user input matches literally
pub(crate) fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[derive(Clone)]
pub struct CategoriesRepository {
    db: Executor,
}

impl CategoriesRepository {
    pub fn new(db: Executor) -> Self {
        Self { db }
    }

    pub async fn get_by_id(&self, id: i32) -> Option<Category> {
        self.db
            .fetch_optional("SELECT * FROM categories WHERE id = $1", &[id.into()])
            .await
            .or_neutral(format_args!("Error retrieving category {}", id))
    }

    pub async fn get_all(&self) -> Vec<Category> {
        self.db
            .fetch_all("SELECT * FROM categories ORDER BY name", &[])
            .await
            .or_neutral("Error retrieving categories")
    }

    pub async fn get_by_audience(&self, audience: &str) -> Vec<Category> {
        self.db
            .fetch_all(
                "SELECT * FROM categories WHERE target_audience = $1 ORDER BY name",
                &[audience.into()],
            )
            .await
            .or_neutral(format_args!("Error retrieving categories for audience {}", audience))
    }

    /// Case-insensitive substring match on name or description
    pub async fn search(&self, query: &str) -> Vec<Category> {
        self.db
            .fetch_all(
                r#"
                SELECT * FROM categories
                WHERE name ILIKE $1 OR description ILIKE $1
                ORDER BY name
                "#,
                &[like_pattern(query).into()],
            )
            .await
            .or_neutral(format_args!("Error searching categories with query '{}'", query))
    }

    pub async fn get_by_event_size(&self, event_size: &str) -> Vec<Category> {
        self.db
            .fetch_all(
                "SELECT * FROM categories WHERE typical_event_size = $1 ORDER BY name",
                &[event_size.into()],
            )
            .await
            .or_neutral(format_args!("Error retrieving categories for event size {}", event_size))
    }

    /// Validate and insert; returns the stored row
    pub async fn create(&self, mut data: Payload) -> Option<Category> {
        if !validate_category_data(&mut data) {
            tracing::warn!("Invalid category data provided");
            return None;
        }
        self.insert(&data).await.or_neutral("Error creating category")
    }

    async fn insert(&self, data: &Payload) -> AppResult<Option<Category>> {
        let params = CATEGORY_COLUMNS
            .iter()
            .map(|(column, kind)| SqlValue::field(data, column, *kind))
            .collect::<AppResult<Vec<_>>>()?;

        self.db
            .execute_returning(
                r#"
                INSERT INTO categories (name, description, target_audience, typical_event_size)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
                &params,
            )
            .await
    }

    /// Apply a partial update; true when a row was changed
    pub async fn update(&self, id: i32, mut data: Payload) -> bool {
        if !validate_category_fields(&mut data) {
            tracing::warn!("Invalid update data provided for category {}", id);
            return false;
        }

        self.apply_update(id, &data)
            .await
            .affected_any()
            .or_neutral(format_args!("Error updating category {}", id))
    }

    async fn apply_update(&self, id: i32, data: &Payload) -> AppResult<u64> {
        match build_update("categories", CATEGORY_COLUMNS, id, data)? {
            Some(statement) => self.db.execute(&statement.sql, &statement.params).await,
            None => {
                tracing::warn!("No updatable fields supplied for category {}", id);
                Ok(0)
            }
        }
    }

    /// Delete a category; its package associations go with it
    pub async fn delete(&self, id: i32) -> bool {
        self.db
            .execute("DELETE FROM categories WHERE id = $1", &[id.into()])
            .await
            .affected_any()
            .or_neutral(format_args!("Error deleting category {}", id))
    }

    pub async fn get_with_equipment(&self, id: i32) -> Option<CategoryWithEquipment> {
        let category = self.get_by_id(id).await?;
        let equipment: Vec<PackagedEquipment> = self
            .db
            .fetch_all(CATEGORY_EQUIPMENT_SQL, &[id.into()])
            .await
            .or_neutral(format_args!("Error retrieving equipment for category {}", id));
        Some(CategoryWithEquipment::new(category, equipment))
    }
}

impl Repository {
    pub async fn get_category(&self, id: i32) -> Option<Category> {
        self.categories.get_by_id(id).await
    }

    pub async fn get_all_categories(&self) -> Vec<Category> {
        self.categories.get_all().await
    }

    pub async fn get_categories_by_audience(&self, audience: &str) -> Vec<Category> {
        self.categories.get_by_audience(audience).await
    }

    pub async fn search_categories(&self, query: &str) -> Vec<Category> {
        self.categories.search(query).await
    }

    pub async fn get_categories_by_event_size(&self, event_size: &str) -> Vec<Category> {
        self.categories.get_by_event_size(event_size).await
    }

    pub async fn create_category(&self, data: Payload) -> Option<Category> {
        self.categories.create(data).await
    }

    pub async fn update_category(&self, id: i32, data: Payload) -> bool {
        self.categories.update(id, data).await
    }

    pub async fn delete_category(&self, id: i32) -> bool {
        self.categories.delete(id).await
    }

    pub async fn get_category_with_equipment(&self, id: i32) -> Option<CategoryWithEquipment> {
        self.categories.get_with_equipment(id).await
    }
}
