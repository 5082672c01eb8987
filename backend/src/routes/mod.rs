//! Route definitions for the NDVI monitoring API

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes
        .merge(protected_routes(state))
}

/// Routes that require a provider-issued access token
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/analyze", post(handlers::analyze))
        .nest("/fields", field_routes())
        .route("/activity", get(handlers::list_activity))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Field management routes
fn field_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_fields).post(handlers::create_field))
        .route(
            "/:field_id",
            get(handlers::get_field)
                .put(handlers::update_field)
                .delete(handlers::delete_field),
        )
        .route("/:field_id/analyses", get(handlers::list_analyses))
}
