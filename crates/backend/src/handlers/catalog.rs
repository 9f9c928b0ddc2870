use axum::extract::State;
use axum::Json;
use contracts::shared::api::ApiResponse;
use contracts::shared::catalog::Catalog;

use crate::shared::state::AppState;

/// GET /api/catalog
pub async fn get_catalog(State(state): State<AppState>) -> Json<ApiResponse<Catalog>> {
    Json(ApiResponse::ok(state.passes.catalog().clone()))
}
