//! Read-side aggregation over the catalog.
//!
//! Every query here degrades to an empty result when it fails; the error is
//! logged and callers never see it.

use super::Repository;
use crate::{
    db::Executor,
    error::LogNeutral,
    models::stats::{
        availability_shares, round2, AudienceBreakdown, AudienceStatistics, AvailabilityBreakdown,
        CategoryCounts, CategoryStatistics, DatabaseOverview, EquipmentCounts, PackageCounts,
        PriceStatistics, StatisticsReport, TypeBreakdown, TypeStatistics,
    },
};

#[derive(Clone)]
pub struct StatisticsRepository {
    db: Executor,
}

impl StatisticsRepository {
    pub fn new(db: Executor) -> Self {
        Self { db }
    }

    /// Overall counts; `None` when they cannot be computed
    pub async fn get_database_overview(&self) -> Option<DatabaseOverview> {
        self.db
            .fetch_optional::<(i64, i64, i64, i64, i64, i64)>(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM equipment),
                    (SELECT COUNT(*) FROM equipment WHERE availability_status = 'available'),
                    (SELECT COUNT(DISTINCT equipment_type) FROM equipment),
                    (SELECT COUNT(*) FROM categories),
                    (SELECT COUNT(DISTINCT target_audience) FROM categories),
                    (SELECT COUNT(*) FROM equipment_categories)
                "#,
                &[],
            )
            .await
            .map(|row| {
                row.map(|(total, available, types, categories, audiences, associations)| {
                    DatabaseOverview {
                        equipment: EquipmentCounts {
                            total,
                            available,
                            types,
                        },
                        categories: CategoryCounts {
                            total: categories,
                            audience_types: audiences,
                        },
                        packages: PackageCounts {
                            total_associations: associations,
                        },
                    }
                })
            })
            .or_neutral("Error getting database overview")
    }

    /// Per-type counts and average price, most common type first
    pub async fn get_equipment_type_statistics(&self) -> TypeBreakdown {
        self.db
            .fetch_all::<(String, i64, i64, f64)>(
                r#"
                SELECT equipment_type,
                       COUNT(*),
                       COUNT(*) FILTER (WHERE availability_status = 'available'),
                       COALESCE(AVG(rental_price_per_day), 0)::float8
                FROM equipment
                GROUP BY equipment_type
                ORDER BY COUNT(*) DESC, equipment_type
                "#,
                &[],
            )
            .await
            .map(|rows| {
                rows.into_iter()
                    .map(|(equipment_type, total_count, available_count, avg_price)| {
                        (
                            equipment_type,
                            TypeStatistics {
                                total_count,
                                available_count,
                                avg_price: round2(avg_price),
                            },
                        )
                    })
                    .collect()
            })
            .or_neutral("Error getting equipment type statistics")
    }

    /// Per-category counts, including empty categories
    pub async fn get_category_statistics(&self) -> Vec<CategoryStatistics> {
        self.db
            .fetch_all::<(String, Option<String>, Option<String>, i64, i64, i64)>(
                r#"
                SELECT c.name,
                       c.target_audience,
                       c.typical_event_size,
                       COUNT(ec.equipment_id) AS equipment_count,
                       COUNT(DISTINCT ec.equipment_id),
                       COALESCE(SUM(ec.quantity_in_package), 0)::int8
                FROM categories c
                LEFT JOIN equipment_categories ec ON c.id = ec.category_id
                GROUP BY c.id, c.name, c.target_audience, c.typical_event_size
                ORDER BY equipment_count DESC, c.name
                "#,
                &[],
            )
            .await
            .map(|rows| {
                rows.into_iter()
                    .map(
                        |(name, target_audience, typical_event_size, equipment_count, unique_equipment_count, total_items)| {
                            CategoryStatistics {
                                name,
                                target_audience,
                                typical_event_size,
                                equipment_count,
                                unique_equipment_count,
                                total_items,
                            }
                        },
                    )
                    .collect()
            })
            .or_neutral("Error getting category statistics")
    }

    pub async fn get_availability_statistics(&self) -> AvailabilityBreakdown {
        self.db
            .fetch_all::<(String, i64)>(
                r#"
                SELECT availability_status, COUNT(*)
                FROM equipment
                GROUP BY availability_status
                ORDER BY COUNT(*) DESC, availability_status
                "#,
                &[],
            )
            .await
            .map(availability_shares)
            .or_neutral("Error getting availability statistics")
    }

    /// Min, max, mean and median daily price over priced equipment
    pub async fn get_price_statistics(&self) -> Option<PriceStatistics> {
        self.db
            .fetch_optional::<(Option<f64>, Option<f64>, Option<f64>, Option<f64>)>(
                r#"
                SELECT MIN(rental_price_per_day)::float8,
                       MAX(rental_price_per_day)::float8,
                       AVG(rental_price_per_day)::float8,
                       PERCENTILE_CONT(0.5) WITHIN GROUP (ORDER BY rental_price_per_day)::float8
                FROM equipment
                WHERE rental_price_per_day IS NOT NULL
                "#,
                &[],
            )
            .await
            .map(|row| match row {
                Some((Some(min), Some(max), Some(avg), Some(median))) => Some(PriceStatistics {
                    min_price: round2(min),
                    max_price: round2(max),
                    avg_price: round2(avg),
                    median_price: round2(median),
                }),
                _ => None,
            })
            .or_neutral("Error getting price statistics")
    }

    pub async fn get_audience_statistics(&self) -> AudienceBreakdown {
        self.db
            .fetch_all::<(String, i64, i64)>(
                r#"
                SELECT COALESCE(c.target_audience, 'unspecified') AS audience,
                       COUNT(DISTINCT c.id) AS category_count,
                       COUNT(DISTINCT e.equipment_type)
                FROM categories c
                LEFT JOIN equipment_categories ec ON c.id = ec.category_id
                LEFT JOIN equipment e ON e.id = ec.equipment_id
                GROUP BY audience
                ORDER BY category_count DESC, audience
                "#,
                &[],
            )
            .await
            .map(|rows| {
                rows.into_iter()
                    .map(|(audience, category_count, total_equipment_types)| {
                        (
                            audience,
                            AudienceStatistics {
                                category_count,
                                total_equipment_types,
                            },
                        )
                    })
                    .collect()
            })
            .or_neutral("Error getting audience statistics")
    }

    pub async fn get_report(&self) -> StatisticsReport {
        StatisticsReport {
            overview: self.get_database_overview().await,
            equipment_types: self.get_equipment_type_statistics().await,
            categories: self.get_category_statistics().await,
            availability: self.get_availability_statistics().await,
            prices: self.get_price_statistics().await,
            audiences: self.get_audience_statistics().await,
        }
    }
}

impl Repository {
    pub async fn get_database_overview(&self) -> Option<DatabaseOverview> {
        self.statistics.get_database_overview().await
    }

    pub async fn get_equipment_type_statistics(&self) -> TypeBreakdown {
        self.statistics.get_equipment_type_statistics().await
    }

    pub async fn get_category_statistics(&self) -> Vec<CategoryStatistics> {
        self.statistics.get_category_statistics().await
    }

    pub async fn get_availability_statistics(&self) -> AvailabilityBreakdown {
        self.statistics.get_availability_statistics().await
    }

    pub async fn get_price_statistics(&self) -> Option<PriceStatistics> {
        self.statistics.get_price_statistics().await
    }

    pub async fn get_audience_statistics(&self) -> AudienceBreakdown {
        self.statistics.get_audience_statistics().await
    }

    pub async fn get_statistics_report(&self) -> StatisticsReport {
        self.statistics.get_report().await
    }
}
