//! Equipment model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;

use super::UnknownVariant;
use crate::db::{
    validate::{sanitize_field, validate_positive_number, validate_required_fields, Payload},
    ColumnKind,
};

pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_BRAND_LENGTH: usize = 100;
pub const MAX_MODEL_LENGTH: usize = 100;

const REQUIRED_FIELDS: &[&str] = &["name", "description", "equipment_type"];

/// Columns a client may set, with their storage kinds
pub const EQUIPMENT_COLUMNS: &[(&str, ColumnKind)] = &[
    ("name", ColumnKind::Text),
    ("description", ColumnKind::Text),
    ("equipment_type", ColumnKind::Text),
    ("brand", ColumnKind::Text),
    ("model", ColumnKind::Text),
    ("power_rating", ColumnKind::Text),
    ("dimensions", ColumnKind::Text),
    ("weight", ColumnKind::Decimal),
    ("rental_price_per_day", ColumnKind::Decimal),
    ("availability_status", ColumnKind::Text),
];

// ---------------------------------------------------------------------------
// EquipmentType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentType {
    Speaker,
    Light,
    Microphone,
    Mixer,
    Amplifier,
    Cable,
    Stand,
    Case,
    Controller,
    Other,
}

impl EquipmentType {
    pub const ALL: [EquipmentType; 10] = [
        EquipmentType::Speaker,
        EquipmentType::Light,
        EquipmentType::Microphone,
        EquipmentType::Mixer,
        EquipmentType::Amplifier,
        EquipmentType::Cable,
        EquipmentType::Stand,
        EquipmentType::Case,
        EquipmentType::Controller,
        EquipmentType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentType::Speaker => "speaker",
            EquipmentType::Light => "light",
            EquipmentType::Microphone => "microphone",
            EquipmentType::Mixer => "mixer",
            EquipmentType::Amplifier => "amplifier",
            EquipmentType::Cable => "cable",
            EquipmentType::Stand => "stand",
            EquipmentType::Case => "case",
            EquipmentType::Controller => "controller",
            EquipmentType::Other => "other",
        }
    }
}

impl FromStr for EquipmentType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EquipmentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("equipment type", s))
    }
}

impl TryFrom<String> for EquipmentType {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AvailabilityStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityStatus {
    #[default]
    Available,
    Rented,
    Maintenance,
    Retired,
}

impl AvailabilityStatus {
    pub const ALL: [AvailabilityStatus; 4] = [
        AvailabilityStatus::Available,
        AvailabilityStatus::Rented,
        AvailabilityStatus::Maintenance,
        AvailabilityStatus::Retired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityStatus::Available => "available",
            AvailabilityStatus::Rented => "rented",
            AvailabilityStatus::Maintenance => "maintenance",
            AvailabilityStatus::Retired => "retired",
        }
    }
}

impl FromStr for AvailabilityStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AvailabilityStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("availability status", s))
    }
}

impl TryFrom<String> for AvailabilityStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

/// Equipment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Equipment {
    pub id: i32,
    pub name: String,
    pub description: String,
    #[sqlx(try_from = "String")]
    pub equipment_type: EquipmentType,
    pub brand: Option<String>,
    pub model: Option<String>,
    /// Free-form rating, e.g. "1000W"
    pub power_rating: Option<String>,
    pub dimensions: Option<String>,
    /// Weight in kilograms
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub weight: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub rental_price_per_day: Option<Decimal>,
    #[sqlx(try_from = "String")]
    pub availability_status: AvailabilityStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Projection used by list and search responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EquipmentSummary {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub equipment_type: EquipmentType,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub availability_status: AvailabilityStatus,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub rental_price_per_day: Option<Decimal>,
}

impl From<Equipment> for EquipmentSummary {
    fn from(e: Equipment) -> Self {
        Self {
            id: e.id,
            name: e.name,
            description: e.description,
            equipment_type: e.equipment_type,
            brand: e.brand,
            model: e.model,
            availability_status: e.availability_status,
            rental_price_per_day: e.rental_price_per_day,
        }
    }
}

/// Equipment together with its membership in one package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PackagedEquipment {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub equipment: Equipment,
    pub quantity_in_package: i32,
    pub is_required: bool,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a full equipment payload for creation, sanitising strings in place
pub fn validate_equipment_data(data: &mut Payload) -> bool {
    if !validate_required_fields(data, REQUIRED_FIELDS) {
        tracing::warn!("Missing required fields for equipment");
        return false;
    }
    validate_equipment_fields(data)
}

/// Validate the fields present in a (possibly partial) payload, sanitising
/// strings in place
pub fn validate_equipment_fields(data: &mut Payload) -> bool {
    for field in REQUIRED_FIELDS {
        if data.get(*field).is_some_and(Value::is_null) {
            tracing::warn!("Equipment {} cannot be null", field);
            return false;
        }
    }

    if let Some(value) = data.get("equipment_type") {
        if value.as_str().and_then(|s| s.parse::<EquipmentType>().ok()).is_none() {
            tracing::warn!("Invalid equipment type: {}", value);
            return false;
        }
    }

    if let Some(value) = data.get("availability_status") {
        if value.as_str().and_then(|s| s.parse::<AvailabilityStatus>().ok()).is_none() {
            tracing::warn!("Invalid availability status: {}", value);
            return false;
        }
    }

    for field in ["weight", "rental_price_per_day"] {
        if let Some(value) = data.get(field) {
            if !validate_positive_number(value, field) {
                return false;
            }
        }
    }

    sanitize_field(data, "name", Some(MAX_NAME_LENGTH));
    sanitize_field(data, "description", None);
    sanitize_field(data, "brand", Some(MAX_BRAND_LENGTH));
    sanitize_field(data, "model", Some(MAX_MODEL_LENGTH));

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    fn valid() -> Payload {
        payload(json!({
            "name": "  JBL EON615  ",
            "description": "15-inch powered PA speaker",
            "equipment_type": "speaker",
            "brand": "JBL",
            "weight": 17.9,
            "rental_price_per_day": 45,
        }))
    }

    #[test]
    fn test_accepts_valid_payload() {
        let mut data = valid();
        assert!(validate_equipment_data(&mut data));
        assert_eq!(data["name"], json!("JBL EON615"));
    }

    #[test]
    fn test_every_type_is_accepted() {
        for t in EquipmentType::ALL {
            let mut data = valid();
            data.insert("equipment_type".into(), json!(t.as_str()));
            assert!(validate_equipment_data(&mut data), "{} rejected", t);
        }
    }

    #[test]
    fn test_rejects_unknown_type() {
        let mut data = valid();
        data.insert("equipment_type".into(), json!("hologram"));
        assert!(!validate_equipment_data(&mut data));
    }

    #[test]
    fn test_rejects_negative_numbers() {
        let mut data = valid();
        data.insert("weight".into(), json!(-2));
        assert!(!validate_equipment_data(&mut data));

        let mut data = valid();
        data.insert("rental_price_per_day".into(), json!(-0.01));
        assert!(!validate_equipment_data(&mut data));
    }

    #[test]
    fn test_rejects_missing_required() {
        let mut data = valid();
        data.remove("description");
        assert!(!validate_equipment_data(&mut data));
    }

    #[test]
    fn test_rejects_unknown_status() {
        let mut data = valid();
        data.insert("availability_status".into(), json!("lost"));
        assert!(!validate_equipment_data(&mut data));

        let mut data = valid();
        data.insert("availability_status".into(), Value::Null);
        assert!(!validate_equipment_data(&mut data));
    }

    #[test]
    fn test_truncates_long_strings() {
        let mut data = valid();
        data.insert("name".into(), json!("x".repeat(300)));
        data.insert("model".into(), json!("m".repeat(150)));
        assert!(validate_equipment_data(&mut data));
        assert_eq!(data["name"].as_str().unwrap().len(), MAX_NAME_LENGTH);
        assert_eq!(data["model"].as_str().unwrap().len(), MAX_MODEL_LENGTH);
    }

    #[test]
    fn test_partial_payload() {
        let mut data = payload(json!({ "rental_price_per_day": 30 }));
        assert!(validate_equipment_fields(&mut data));
        assert!(!validate_equipment_data(&mut data));

        let mut data = payload(json!({ "name": null }));
        assert!(!validate_equipment_fields(&mut data));
    }

    #[test]
    fn test_enum_round_trip_through_strings() {
        assert_eq!("mixer".parse::<EquipmentType>().unwrap(), EquipmentType::Mixer);
        assert!("Mixer".parse::<EquipmentType>().is_err());
        assert_eq!(AvailabilityStatus::default(), AvailabilityStatus::Available);
        assert_eq!(
            AvailabilityStatus::try_from("maintenance".to_string()).unwrap(),
            AvailabilityStatus::Maintenance
        );
    }
}
