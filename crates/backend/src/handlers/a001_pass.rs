use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use contracts::domain::a001_pass::aggregate::{
    CreatePassDto, IssueBatchDto, MergeEventsDto, Pass, SetSoldDto, UpdatePassDto,
};
use contracts::domain::a001_pass::query::PassListQuery;
use contracts::shared::api::ApiResponse;
use serde::Deserialize;

use crate::shared::api_error::ApiError;
use crate::shared::state::AppState;
use crate::system::auth::extractor::CurrentUser;

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct NextBarcodeQuery {
    pub prefix: Option<String>,
}

/// GET /api/passes
pub async fn list_all(State(state): State<AppState>) -> ApiResult<Vec<Pass>> {
    let passes = state.passes.list_all().await?;
    Ok(Json(ApiResponse::ok(passes)))
}

/// GET /api/passes/search?q=&sold=&passType=
pub async fn search(
    State(state): State<AppState>,
    query: Result<Query<PassListQuery>, QueryRejection>,
) -> ApiResult<Vec<Pass>> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let passes = state.passes.search(&query).await?;
    Ok(Json(ApiResponse::ok(passes)))
}

/// GET /api/passes/:id
pub async fn get_by_id(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Pass> {
    let pass = state.passes.get_by_id(&id).await?;
    Ok(Json(ApiResponse::ok(pass)))
}

/// GET /api/passes/barcode/:barcode
pub async fn get_by_barcode(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> ApiResult<Pass> {
    let pass = state.passes.get_by_barcode(&barcode).await?;
    Ok(Json(ApiResponse::ok(pass)))
}

/// POST /api/passes/scan/:barcode
pub async fn scan(State(state): State<AppState>, Path(barcode): Path<String>) -> ApiResult<Pass> {
    let pass = state.passes.scan(&barcode).await?;
    Ok(Json(ApiResponse::ok_with_message(pass, "Pass scanned successfully")))
}

/// POST /api/passes
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<CreatePassDto>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Pass>>), ApiError> {
    let Json(dto) = body?;
    let pass = state.passes.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(pass, "Pass created successfully")),
    ))
}

/// PATCH /api/passes
pub async fn update(
    State(state): State<AppState>,
    body: Result<Json<UpdatePassDto>, JsonRejection>,
) -> ApiResult<Pass> {
    let Json(dto) = body?;
    let pass = state.passes.update(dto).await?;
    Ok(Json(ApiResponse::ok_with_message(pass, "Pass updated successfully")))
}

/// PATCH /api/passes/events
pub async fn merge_events(
    State(state): State<AppState>,
    body: Result<Json<MergeEventsDto>, JsonRejection>,
) -> ApiResult<Pass> {
    let Json(dto) = body?;
    let pass = state.passes.merge_events(dto).await?;
    Ok(Json(ApiResponse::ok_with_message(pass, "Pass updated successfully")))
}

/// PATCH /api/passes/:id/sold
pub async fn set_sold(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<SetSoldDto>, JsonRejection>,
) -> ApiResult<Pass> {
    let Json(dto) = body?;
    let pass = state.passes.set_sold(&id, dto.is_sold).await?;
    Ok(Json(ApiResponse::ok_with_message(pass, "Pass updated successfully")))
}

/// DELETE /api/passes/:id
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.passes.delete(&id).await?;
    tracing::info!("Pass {} deleted by '{}'", id, claims.sub);
    Ok(Json(ApiResponse::message("Pass deleted successfully")))
}

/// POST /api/passes/batch
pub async fn issue_batch(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    body: Result<Json<IssueBatchDto>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<Pass>>>), ApiError> {
    let Json(dto) = body?;
    tracing::info!(
        "'{}' requested {} {} passes",
        claims.sub,
        dto.count,
        dto.pass_type
    );
    let passes = state.passes.issue_batch(dto).await?;
    let message = format!("Issued {} passes", passes.len());
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(passes, message)),
    ))
}

/// GET /api/passes/next-barcode?prefix=
pub async fn next_barcode(
    State(state): State<AppState>,
    Query(query): Query<NextBarcodeQuery>,
) -> ApiResult<String> {
    let barcode = state.passes.next_barcode(query.prefix.as_deref()).await?;
    Ok(Json(ApiResponse::ok(barcode)))
}

/// GET /api/passes/available/:pass_type
pub async fn lowest_unsold(
    State(state): State<AppState>,
    Path(pass_type): Path<String>,
) -> ApiResult<Pass> {
    let pass = state.passes.lowest_unsold(&pass_type).await?;
    Ok(Json(ApiResponse::ok(pass)))
}
