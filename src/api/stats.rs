//! Statistics endpoints

use axum::{extract::State, Json};

use crate::{models::stats::StatisticsReport, AppState};

/// Catalog statistics
#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Catalog statistics", body = StatisticsReport)
    )
)]
pub async fn get_stats(State(state): State<AppState>) -> Json<StatisticsReport> {
    Json(state.repository.get_statistics_report().await)
}
