//! Equipment endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    models::{
        equipment::{AvailabilityStatus, Equipment, EquipmentSummary},
        package::PackageCompatibility,
    },
    AppState,
};

/// Filters for the equipment list; `type` wins over `availability`
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct EquipmentFilter {
    /// Equipment type, e.g. "speaker"
    #[serde(rename = "type")]
    pub equipment_type: Option<String>,
    /// Availability status, e.g. "available"
    pub availability: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EquipmentListResponse {
    pub equipment: Vec<EquipmentSummary>,
    pub total: usize,
}

/// List equipment, optionally filtered by type or availability
#[utoipa::path(
    get,
    path = "/api/equipment",
    tag = "equipment",
    params(EquipmentFilter),
    responses(
        (status = 200, description = "Equipment list", body = EquipmentListResponse)
    )
)]
pub async fn list_equipment(
    State(state): State<AppState>,
    Query(filter): Query<EquipmentFilter>,
) -> Json<EquipmentListResponse> {
    let repository = &state.repository;
    let equipment_type = filter.equipment_type.filter(|t| !t.is_empty());
    let availability = filter.availability.filter(|a| !a.is_empty());

    let equipment = match (equipment_type, availability) {
        (Some(equipment_type), _) => repository.get_equipment_by_type(&equipment_type).await,
        (None, Some(status)) if status == AvailabilityStatus::Available.as_str() => {
            repository.get_available_equipment().await
        }
        (None, Some(status)) => repository.get_equipment_by_availability(&status).await,
        (None, None) => repository.get_all_equipment().await,
    };

    let equipment: Vec<EquipmentSummary> = equipment.into_iter().map(Into::into).collect();
    Json(EquipmentListResponse {
        total: equipment.len(),
        equipment,
    })
}

/// Get equipment details by ID
#[utoipa::path(
    get,
    path = "/api/equipment/{id}",
    tag = "equipment",
    params(("id" = i32, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "Equipment details", body = Equipment),
        (status = 404, description = "Equipment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_equipment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Equipment>> {
    state
        .repository
        .get_equipment(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Equipment not found".to_string()))
}

/// Packages containing an equipment item
#[utoipa::path(
    get,
    path = "/api/equipment/{id}/packages",
    tag = "equipment",
    params(("id" = i32, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "Package memberships", body = Vec<PackageCompatibility>),
        (status = 404, description = "Equipment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_equipment_packages(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<PackageCompatibility>>> {
    if state.repository.get_equipment(id).await.is_none() {
        return Err(AppError::NotFound("Equipment not found".to_string()));
    }
    Ok(Json(state.repository.get_equipment_compatibility(id).await))
}
