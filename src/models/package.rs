//! Equipment-category associations and the package views built on them

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::{
    category::{Category, CategorySummary},
    equipment::{Equipment, EquipmentType, PackagedEquipment},
};

/// Junction row linking one equipment item to one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EquipmentCategory {
    pub id: i32,
    pub equipment_id: i32,
    pub category_id: i32,
    pub quantity_in_package: i32,
    pub is_required: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Quantity and requirement flag of an item inside a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PackageMembership {
    pub quantity_in_package: i32,
    pub is_required: bool,
}

/// A category an equipment item belongs to, with its membership metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CategoryMembership {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub category: Category,
    pub quantity_in_package: i32,
    pub is_required: bool,
}

/// One equipment item's place in one package
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PackageCompatibility {
    pub category: CategorySummary,
    pub package_details: PackageMembership,
    pub equipment: Equipment,
}

impl PackageCompatibility {
    pub fn new(membership: CategoryMembership, equipment: Equipment) -> Self {
        Self {
            package_details: PackageMembership {
                quantity_in_package: membership.quantity_in_package,
                is_required: membership.is_required,
            },
            category: membership.category.into(),
            equipment,
        }
    }
}

/// Derived figures for a package
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PackageStatistics {
    pub total_equipment_types: usize,
    /// Sum of quantities
    pub total_items: i64,
    pub required_items: i64,
    pub optional_items: i64,
    /// Sum of price x quantity, rounded to cents
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub estimated_daily_cost: Decimal,
}

impl PackageStatistics {
    pub fn from_equipment(equipment: &[PackagedEquipment]) -> Self {
        let mut total_items = 0i64;
        let mut required_items = 0i64;
        let mut total_value = Decimal::ZERO;
        let mut types = Vec::new();

        for item in equipment {
            let quantity = i64::from(item.quantity_in_package);
            total_items += quantity;
            if item.is_required {
                required_items += quantity;
            }
            if let Some(price) = item.equipment.rental_price_per_day {
                total_value += price * Decimal::from(item.quantity_in_package);
            }
            if !types.contains(&item.equipment.equipment_type) {
                types.push(item.equipment.equipment_type);
            }
        }

        Self {
            total_equipment_types: types.len(),
            total_items,
            required_items,
            optional_items: total_items - required_items,
            estimated_daily_cost: total_value.round_dp(2),
        }
    }
}

/// Complete view of a package
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PackageDetails {
    pub category: CategorySummary,
    pub equipment: Vec<PackagedEquipment>,
    /// Equipment grouped by type, groups in first-seen order
    #[schema(value_type = Object)]
    pub equipment_by_type: IndexMap<EquipmentType, Vec<PackagedEquipment>>,
    pub statistics: PackageStatistics,
}

impl PackageDetails {
    pub fn new(category: Category, equipment: Vec<PackagedEquipment>) -> Self {
        let statistics = PackageStatistics::from_equipment(&equipment);

        let mut equipment_by_type: IndexMap<EquipmentType, Vec<PackagedEquipment>> = IndexMap::new();
        for item in &equipment {
            equipment_by_type
                .entry(item.equipment.equipment_type)
                .or_default()
                .push(item.clone());
        }

        Self {
            category: category.into(),
            equipment,
            equipment_by_type,
            statistics,
        }
    }
}

fn default_quantity() -> i32 {
    1
}

fn default_required() -> bool {
    true
}

/// One entry of a package creation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PackageItem {
    pub equipment_id: i32,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default = "default_required")]
    pub required: bool,
}
