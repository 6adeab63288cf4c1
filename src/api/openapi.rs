//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{categories, equipment, health, packages, search, stats};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Equipment Catalog API",
        version = "1.0.0",
        description = "Search and browse rentable equipment and packages"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Search
        search::search,
        // Equipment
        equipment::list_equipment,
        equipment::get_equipment,
        equipment::get_equipment_packages,
        // Categories
        categories::list_categories,
        categories::get_category,
        // Packages
        packages::find_packages,
        packages::get_package,
        packages::create_package,
        packages::duplicate_package,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            health::HealthResponse,
            health::ReadinessResponse,
            crate::db::PoolStatus,
            search::SearchResponse,
            search::CategoryHit,
            equipment::EquipmentListResponse,
            crate::models::equipment::Equipment,
            crate::models::equipment::EquipmentSummary,
            crate::models::equipment::EquipmentType,
            crate::models::equipment::AvailabilityStatus,
            crate::models::equipment::PackagedEquipment,
            crate::models::category::Category,
            crate::models::category::CategorySummary,
            crate::models::category::CategoryWithEquipment,
            crate::models::package::EquipmentCategory,
            crate::models::package::CategoryMembership,
            crate::models::package::PackageDetails,
            crate::models::package::PackageStatistics,
            crate::models::package::PackageMembership,
            crate::models::package::PackageCompatibility,
            crate::models::package::PackageItem,
            packages::CreatePackageRequest,
            crate::models::stats::StatisticsReport,
            crate::models::stats::DatabaseOverview,
            crate::models::stats::EquipmentCounts,
            crate::models::stats::CategoryCounts,
            crate::models::stats::PackageCounts,
            crate::models::stats::CategoryStatistics,
            crate::models::stats::PriceStatistics,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "search", description = "Catalog search"),
        (name = "equipment", description = "Equipment lookup"),
        (name = "categories", description = "Category lookup"),
        (name = "packages", description = "Package views and composition"),
        (name = "stats", description = "Statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
