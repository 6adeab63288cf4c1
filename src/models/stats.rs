//! Aggregate statistics over the catalog

use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct EquipmentCounts {
    pub total: i64,
    pub available: i64,
    /// Number of distinct equipment types in use
    pub types: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct CategoryCounts {
    pub total: i64,
    pub audience_types: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct PackageCounts {
    pub total_associations: i64,
}

/// Overall counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct DatabaseOverview {
    pub equipment: EquipmentCounts,
    pub categories: CategoryCounts,
    pub packages: PackageCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TypeStatistics {
    pub total_count: i64,
    pub available_count: i64,
    pub avg_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CategoryStatistics {
    pub name: String,
    pub target_audience: Option<String>,
    pub typical_event_size: Option<String>,
    pub equipment_count: i64,
    pub unique_equipment_count: i64,
    pub total_items: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AvailabilityShare {
    pub count: i64,
    /// Share of all equipment, in percent
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct PriceStatistics {
    pub min_price: f64,
    pub max_price: f64,
    pub avg_price: f64,
    pub median_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AudienceStatistics {
    pub category_count: i64,
    pub total_equipment_types: i64,
}

pub type TypeBreakdown = IndexMap<String, TypeStatistics>;
pub type AvailabilityBreakdown = IndexMap<String, AvailabilityShare>;
pub type AudienceBreakdown = IndexMap<String, AudienceStatistics>;

/// Every statistic in one document
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatisticsReport {
    pub overview: Option<DatabaseOverview>,
    #[schema(value_type = Object)]
    pub equipment_types: TypeBreakdown,
    pub categories: Vec<CategoryStatistics>,
    #[schema(value_type = Object)]
    pub availability: AvailabilityBreakdown,
    pub prices: Option<PriceStatistics>,
    #[schema(value_type = Object)]
    pub audiences: AudienceBreakdown,
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Turn per-status counts into counts with their share of the total
pub fn availability_shares(counts: Vec<(String, i64)>) -> AvailabilityBreakdown {
    let total: i64 = counts.iter().map(|(_, count)| count).sum();
    counts
        .into_iter()
        .map(|(status, count)| {
            let percentage = if total == 0 {
                0.0
            } else {
                round2(count as f64 * 100.0 / total as f64)
            };
            (status, AvailabilityShare { count, percentage })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.345_6), 12.35);
        assert_eq!(round2(0.0), 0.0);
        assert_eq!(round2(99.994), 99.99);
    }

    #[test]
    fn test_availability_shares() {
        let shares = availability_shares(vec![
            ("available".into(), 2),
            ("rented".into(), 1),
        ]);
        assert_eq!(shares["available"].count, 2);
        assert_eq!(shares["available"].percentage, 66.67);
        assert_eq!(shares["rented"].percentage, 33.33);
        // order is preserved
        assert_eq!(shares.get_index(0).unwrap().0, "available");
    }

    #[test]
    fn test_availability_shares_empty() {
        assert!(availability_shares(Vec::new()).is_empty());
    }
}
