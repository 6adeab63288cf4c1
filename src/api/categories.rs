//! Category endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::{AppError, AppResult},
    models::category::{Category, CategoryWithEquipment},
    AppState,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CategoryFilter {
    /// Target audience, e.g. "wedding"
    pub audience: Option<String>,
    /// Typical event size, e.g. "large"
    pub event_size: Option<String>,
}

/// List categories, optionally by audience or event size
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "categories",
    params(CategoryFilter),
    responses(
        (status = 200, description = "Categories", body = Vec<Category>)
    )
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(filter): Query<CategoryFilter>,
) -> Json<Vec<Category>> {
    let repository = &state.repository;
    let categories = match (filter.audience, filter.event_size) {
        (Some(audience), _) => repository.get_categories_by_audience(&audience).await,
        (None, Some(size)) => repository.get_categories_by_event_size(&size).await,
        (None, None) => repository.get_all_categories().await,
    };
    Json(categories)
}

/// Get a category with its equipment
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    tag = "categories",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category with equipment", body = CategoryWithEquipment),
        (status = 404, description = "Category not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<CategoryWithEquipment>> {
    state
        .repository
        .get_category_with_equipment(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
}
