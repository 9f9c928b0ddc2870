use axum::{
    body::Body,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::shared::api_error::ApiError;
use crate::shared::state::AppState;

/// Middleware that requires a valid admin JWT
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    // Extract Authorization header
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::unauthorized("Authorization required"))?;

    let claims = super::jwt::validate_token(token, &state.auth.jwt_secret).map_err(|e| {
        tracing::warn!("Rejected token: {:#}", e);
        ApiError::unauthorized("Invalid or expired token")
    })?;

    if !claims.is_admin {
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    // Add claims to request extensions for use in handlers
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
