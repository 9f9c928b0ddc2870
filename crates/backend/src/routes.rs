use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

use crate::shared::state::AppState;
use crate::{handlers, system};

/// Конфигурация всех роутов приложения
pub fn configure_routes(state: AppState) -> Router {
    // ========================================
    // PUBLIC ROUTES (scanner, lookups)
    // ========================================
    let public = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/auth/login", post(system::handlers::auth::login))
        .route("/api/catalog", get(handlers::catalog::get_catalog))
        .route("/api/passes", get(handlers::a001_pass::list_all))
        .route("/api/passes/search", get(handlers::a001_pass::search))
        .route(
            "/api/passes/barcode/:barcode",
            get(handlers::a001_pass::get_by_barcode),
        )
        .route("/api/passes/:id", get(handlers::a001_pass::get_by_id))
        .route("/api/passes/scan/:barcode", post(handlers::a001_pass::scan));

    // ========================================
    // ADMIN ROUTES (issuing and editing passes)
    // ========================================
    let admin = Router::new()
        .route(
            "/api/passes",
            post(handlers::a001_pass::create).patch(handlers::a001_pass::update),
        )
        .route("/api/passes/events", patch(handlers::a001_pass::merge_events))
        .route("/api/passes/batch", post(handlers::a001_pass::issue_batch))
        .route(
            "/api/passes/next-barcode",
            get(handlers::a001_pass::next_barcode),
        )
        .route(
            "/api/passes/available/:pass_type",
            get(handlers::a001_pass::lowest_unsold),
        )
        .route("/api/passes/:id", delete(handlers::a001_pass::delete))
        .route("/api/passes/:id/sold", patch(handlers::a001_pass::set_sold))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            system::auth::middleware::require_admin,
        ));

    public.merge(admin).with_state(state)
}
