//! Equipment repository

use super::Repository;
use crate::{
    db::{statement::build_update, validate::Payload, AffectedRows, Executor, SqlValue},
    error::{AppResult, LogNeutral},
    models::equipment::{
        validate_equipment_data, validate_equipment_fields, AvailabilityStatus, Equipment,
        PackagedEquipment, EQUIPMENT_COLUMNS,
    },
};

/// Equipment of one category with membership columns; required first, then by type and name
pub(crate) const CATEGORY_EQUIPMENT_SQL: &str = r#"
    SELECT e.*, ec.quantity_in_package, ec.is_required
    FROM equipment e
    JOIN equipment_categories ec ON e.id = ec.equipment_id
    WHERE ec.category_id = $1
    ORDER BY ec.is_required DESC, e.equipment_type, e.name
"#;

#[derive(Clone)]
pub struct EquipmentRepository {
    db: Executor,
}

impl EquipmentRepository {
    pub fn new(db: Executor) -> Self {
        Self { db }
    }

    /// Get equipment by ID
    pub async fn get_by_id(&self, id: i32) -> Option<Equipment> {
        self.db
            .fetch_optional("SELECT * FROM equipment WHERE id = $1", &[id.into()])
            .await
            .or_neutral(format_args!("Error retrieving equipment {}", id))
    }

    pub async fn get_by_type(&self, equipment_type: &str) -> Vec<Equipment> {
        self.db
            .fetch_all(
                "SELECT * FROM equipment WHERE equipment_type = $1 ORDER BY name",
                &[equipment_type.into()],
            )
            .await
            .or_neutral(format_args!("Error retrieving equipment of type {}", equipment_type))
    }

    /// Full-text search over name and description, best match first
    pub async fn search(&self, query: &str) -> Vec<Equipment> {
        self.db
            .fetch_all(
                r#"
                SELECT *,
                       ts_rank(to_tsvector('english', name || ' ' || description),
                               plainto_tsquery('english', $1)) AS rank
                FROM equipment
                WHERE to_tsvector('english', name || ' ' || description)
                      @@ plainto_tsquery('english', $1)
                ORDER BY rank DESC, name
                "#,
                &[query.into()],
            )
            .await
            .or_neutral(format_args!("Error searching equipment with query '{}'", query))
    }

    pub async fn get_available(&self) -> Vec<Equipment> {
        self.db
            .fetch_all(
                "SELECT * FROM equipment WHERE availability_status = $1 ORDER BY name",
                &[AvailabilityStatus::Available.as_str().into()],
            )
            .await
            .or_neutral("Error retrieving available equipment")
    }

    /// Equipment in a category, annotated with quantity and requirement flag
    pub async fn get_by_category(&self, category_id: i32) -> Vec<PackagedEquipment> {
        self.db
            .fetch_all(CATEGORY_EQUIPMENT_SQL, &[category_id.into()])
            .await
            .or_neutral(format_args!("Error retrieving equipment for category {}", category_id))
    }

    pub async fn get_all(&self) -> Vec<Equipment> {
        self.db
            .fetch_all("SELECT * FROM equipment ORDER BY name", &[])
            .await
            .or_neutral("Error retrieving equipment")
    }

    /// Equipment with the given status; unknown statuses yield nothing
    pub async fn get_by_availability(&self, status: &str) -> Vec<Equipment> {
        let status = match status.parse::<AvailabilityStatus>() {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!("{}", e);
                return Vec::new();
            }
        };

        self.db
            .fetch_all(
                "SELECT * FROM equipment WHERE availability_status = $1 ORDER BY name",
                &[status.as_str().into()],
            )
            .await
            .or_neutral(format_args!("Error retrieving equipment with status {}", status))
    }

    /// Validate and insert; returns the stored row
    pub async fn create(&self, mut data: Payload) -> Option<Equipment> {
        if !validate_equipment_data(&mut data) {
            tracing::warn!("Invalid equipment data provided");
            return None;
        }
        self.insert(&data).await.or_neutral("Error creating equipment")
    }

    async fn insert(&self, data: &Payload) -> AppResult<Option<Equipment>> {
        let params = EQUIPMENT_COLUMNS
            .iter()
            .map(|(column, kind)| SqlValue::field(data, column, *kind))
            .collect::<AppResult<Vec<_>>>()?;

        self.db
            .execute_returning(
                r#"
                INSERT INTO equipment (name, description, equipment_type, brand, model,
                                       power_rating, dimensions, weight, rental_price_per_day,
                                       availability_status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, COALESCE($10, 'available'))
                RETURNING *
                "#,
                &params,
            )
            .await
    }

    /// Apply a partial update; true when a row was changed
    pub async fn update(&self, id: i32, mut data: Payload) -> bool {
        if !validate_equipment_fields(&mut data) {
            tracing::warn!("Invalid update data provided for equipment {}", id);
            return false;
        }

        self.apply_update(id, &data)
            .await
            .affected_any()
            .or_neutral(format_args!("Error updating equipment {}", id))
    }

    async fn apply_update(&self, id: i32, data: &Payload) -> AppResult<u64> {
        match build_update("equipment", EQUIPMENT_COLUMNS, id, data)? {
            Some(statement) => self.db.execute(&statement.sql, &statement.params).await,
            None => {
                tracing::warn!("No updatable fields supplied for equipment {}", id);
                Ok(0)
            }
        }
    }

    pub async fn delete(&self, id: i32) -> bool {
        self.db
            .execute("DELETE FROM equipment WHERE id = $1", &[id.into()])
            .await
            .affected_any()
            .or_neutral(format_args!("Error deleting equipment {}", id))
    }
}

impl Repository {
    pub async fn get_equipment(&self, id: i32) -> Option<Equipment> {
        self.equipment.get_by_id(id).await
    }

    pub async fn get_equipment_by_type(&self, equipment_type: &str) -> Vec<Equipment> {
        self.equipment.get_by_type(equipment_type).await
    }

    pub async fn search_equipment(&self, query: &str) -> Vec<Equipment> {
        self.equipment.search(query).await
    }

    pub async fn get_available_equipment(&self) -> Vec<Equipment> {
        self.equipment.get_available().await
    }

    pub async fn get_all_equipment(&self) -> Vec<Equipment> {
        self.equipment.get_all().await
    }

    pub async fn get_equipment_by_availability(&self, status: &str) -> Vec<Equipment> {
        self.equipment.get_by_availability(status).await
    }

    pub async fn get_equipment_by_category(&self, category_id: i32) -> Vec<PackagedEquipment> {
        self.equipment.get_by_category(category_id).await
    }

    pub async fn create_equipment(&self, data: Payload) -> Option<Equipment> {
        self.equipment.create(data).await
    }

    pub async fn update_equipment(&self, id: i32, data: Payload) -> bool {
        self.equipment.update(id, data).await
    }

    pub async fn delete_equipment(&self, id: i32) -> bool {
        self.equipment.delete(id).await
    }
}
