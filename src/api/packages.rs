//! Package endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    db::validate::Payload,
    error::{AppError, AppResult},
    models::package::{PackageDetails, PackageItem},
    AppState,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PackageQuery {
    /// Search category names and descriptions
    pub q: Option<String>,
    pub audience: Option<String>,
    pub event_size: Option<String>,
}

/// Request body for creating a package
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePackageRequest {
    /// Category fields: name (required), description, target_audience, typical_event_size
    #[schema(value_type = Object)]
    pub category: Payload,
    #[serde(default)]
    pub equipment: Vec<PackageItem>,
}

/// Find packages by search terms, or by audience and event size
#[utoipa::path(
    get,
    path = "/api/packages",
    tag = "packages",
    params(PackageQuery),
    responses(
        (status = 200, description = "Matching packages", body = Vec<PackageDetails>),
        (status = 400, description = "No filter given", body = crate::error::ErrorResponse)
    )
)]
pub async fn find_packages(
    State(state): State<AppState>,
    Query(query): Query<PackageQuery>,
) -> AppResult<Json<Vec<PackageDetails>>> {
    let repository = &state.repository;
    match query {
        PackageQuery { q: Some(q), .. } if !q.trim().is_empty() => {
            Ok(Json(repository.search_packages(q.trim()).await))
        }
        PackageQuery {
            audience: Some(audience),
            event_size: Some(event_size),
            ..
        } => Ok(Json(
            repository
                .get_packages_by_audience_and_size(&audience, &event_size)
                .await,
        )),
        _ => Err(AppError::BadRequest(
            "Provide q, or both audience and event_size".to_string(),
        )),
    }
}

/// Get package details
#[utoipa::path(
    get,
    path = "/api/packages/{id}",
    tag = "packages",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Package details", body = PackageDetails),
        (status = 404, description = "Package not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_package(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<PackageDetails>> {
    state
        .repository
        .get_package_details(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Package not found".to_string()))
}

/// Create a package from a list of equipment
#[utoipa::path(
    post,
    path = "/api/packages",
    tag = "packages",
    request_body = CreatePackageRequest,
    responses(
        (status = 201, description = "Package created", body = PackageDetails),
        (status = 400, description = "Malformed body or invalid category data", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_package(
    State(state): State<AppState>,
    body: Result<Json<CreatePackageRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<PackageDetails>)> {
    let Json(request) = body?;
    state
        .repository
        .create_package_from_equipment_list(request.category, &request.equipment)
        .await
        .map(|details| (StatusCode::CREATED, Json(details)))
        .ok_or_else(|| AppError::BadRequest("Invalid package data".to_string()))
}

/// Copy a package into a new category
#[utoipa::path(
    post,
    path = "/api/packages/{id}/duplicate",
    tag = "packages",
    params(("id" = i32, Path, description = "Source category ID")),
    request_body = Object,
    responses(
        (status = 201, description = "Package duplicated", body = PackageDetails),
        (status = 400, description = "Invalid category data", body = crate::error::ErrorResponse),
        (status = 404, description = "Source package not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn duplicate_package(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    body: Result<Json<Payload>, JsonRejection>,
) -> AppResult<(StatusCode, Json<PackageDetails>)> {
    let Json(category) = body?;
    if state.repository.get_category(id).await.is_none() {
        return Err(AppError::NotFound("Package not found".to_string()));
    }

    state
        .repository
        .duplicate_package(id, category)
        .await
        .map(|details| (StatusCode::CREATED, Json(details)))
        .ok_or_else(|| AppError::BadRequest("Invalid package data".to_string()))
}
