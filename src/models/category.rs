//! Category (rentable package) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;

use super::equipment::PackagedEquipment;
use crate::db::{
    validate::{sanitize_field, validate_required_fields, Payload},
    ColumnKind,
};

pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_AUDIENCE_LENGTH: usize = 100;
pub const MAX_EVENT_SIZE_LENGTH: usize = 50;

/// Columns a client may set, with their storage kinds
pub const CATEGORY_COLUMNS: &[(&str, ColumnKind)] = &[
    ("name", ColumnKind::Text),
    ("description", ColumnKind::Text),
    ("target_audience", ColumnKind::Text),
    ("typical_event_size", ColumnKind::Text),
];

/// Category record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    /// e.g. "wedding", "corporate", "club"
    pub target_audience: Option<String>,
    /// e.g. "small", "medium", "large"
    pub typical_event_size: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Category without timestamps, as embedded in package views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategorySummary {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub target_audience: Option<String>,
    pub typical_event_size: Option<String>,
}

impl From<Category> for CategorySummary {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
            target_audience: c.target_audience,
            typical_event_size: c.typical_event_size,
        }
    }
}

/// A category with its equipment list and derived counts
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryWithEquipment {
    pub category: Category,
    pub equipment: Vec<PackagedEquipment>,
    pub total_equipment_count: usize,
    pub required_equipment_count: usize,
}

impl CategoryWithEquipment {
    pub fn new(category: Category, equipment: Vec<PackagedEquipment>) -> Self {
        let required_equipment_count = equipment.iter().filter(|e| e.is_required).count();
        Self {
            category,
            total_equipment_count: equipment.len(),
            required_equipment_count,
            equipment,
        }
    }
}

/// Validate a full category payload for creation, sanitising strings in place
pub fn validate_category_data(data: &mut Payload) -> bool {
    if !validate_required_fields(data, &["name"]) {
        tracing::warn!("Missing required fields for category");
        return false;
    }
    validate_category_fields(data)
}

/// Validate the fields present in a (possibly partial) payload
pub fn validate_category_fields(data: &mut Payload) -> bool {
    if data.get("name").is_some_and(Value::is_null) {
        tracing::warn!("Category name cannot be null");
        return false;
    }

    for (field, _) in CATEGORY_COLUMNS {
        if let Some(value) = data.get(*field) {
            if value.is_array() || value.is_object() {
                tracing::warn!("Category {} must be a string, got: {}", field, value);
                return false;
            }
        }
    }

    sanitize_field(data, "name", Some(MAX_NAME_LENGTH));
    sanitize_field(data, "description", None);
    sanitize_field(data, "target_audience", Some(MAX_AUDIENCE_LENGTH));
    sanitize_field(data, "typical_event_size", Some(MAX_EVENT_SIZE_LENGTH));

    if data.get("name").and_then(Value::as_str).is_some_and(str::is_empty) {
        tracing::warn!("Category name cannot be blank");
        return false;
    }

    true
}
