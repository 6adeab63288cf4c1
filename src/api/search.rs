//! Search page and search endpoint

use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    models::{category::Category, equipment::EquipmentSummary},
    AppState,
};

const SEARCH_PAGE: &str = include_str!("../../static/search.html");

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Search terms
    pub q: Option<String>,
}

/// Category as listed in search results
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryHit {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

impl From<Category> for CategoryHit {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    pub equipment: Vec<EquipmentSummary>,
    pub categories: Vec<CategoryHit>,
    pub query: String,
    pub total_equipment: usize,
    pub total_categories: usize,
}

/// Static search page
pub async fn search_page() -> Html<&'static str> {
    Html(SEARCH_PAGE)
}

/// Search equipment (full text) and categories (substring)
#[utoipa::path(
    get,
    path = "/api/search",
    tag = "search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching equipment and categories", body = SearchResponse),
        (status = 400, description = "Empty query", body = crate::error::ErrorResponse)
    )
)]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<SearchResponse>> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(AppError::BadRequest("Search query is required".to_string()));
    }

    let equipment: Vec<EquipmentSummary> = state
        .repository
        .search_equipment(query)
        .await
        .into_iter()
        .map(Into::into)
        .collect();
    let categories: Vec<CategoryHit> = state
        .repository
        .search_categories(query)
        .await
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(SearchResponse {
        total_equipment: equipment.len(),
        total_categories: categories.len(),
        equipment,
        categories,
        query: query.to_string(),
    }))
}
