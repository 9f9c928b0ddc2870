use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use contracts::shared::api::ApiResponse;
use contracts::system::auth::{LoginRequest, LoginResponse};

use crate::shared::api_error::ApiError;
use crate::shared::state::AppState;
use crate::system::auth::{jwt, password};

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let Json(request) = body?;
    let auth = &state.auth;

    let verified = match &auth.admin_password_hash {
        Some(hash) if request.username.trim() == auth.admin_username => {
            password::verify_password(&request.password, hash).map_err(|e| {
                tracing::error!("Admin password hash is unusable: {:#}", e);
                ApiError::internal()
            })?
        }
        _ => false,
    };

    if !verified {
        tracing::warn!("Failed login attempt for '{}'", request.username);
        return Err(ApiError::unauthorized("Invalid username or password"));
    }

    let (access_token, expires_at) = jwt::generate_access_token(
        &auth.admin_username,
        true,
        &auth.jwt_secret,
        auth.token_lifetime_hours,
    )
    .map_err(|e| {
        tracing::error!("Token generation failed: {:#}", e);
        ApiError::internal()
    })?;

    tracing::info!("Admin '{}' logged in", auth.admin_username);

    Ok(Json(ApiResponse::ok(LoginResponse {
        access_token,
        expires_at,
        username: auth.admin_username.clone(),
        is_admin: true,
    })))
}
