//! Data models for the equipment catalog

pub mod category;
pub mod equipment;
pub mod package;
pub mod stats;

use thiserror::Error;

// Re-export commonly used types
pub use category::{Category, CategorySummary, CategoryWithEquipment};
pub use equipment::{AvailabilityStatus, Equipment, EquipmentSummary, EquipmentType, PackagedEquipment};
pub use package::{
    CategoryMembership, EquipmentCategory, PackageCompatibility, PackageDetails, PackageItem,
    PackageStatistics,
};

/// A stored or submitted string that names no known enum variant
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
