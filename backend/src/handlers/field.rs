//! Field management HTTP handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use uuid::Uuid;

use crate::extract::{AppJson, AppPath};
use crate::middleware::CurrentUser;
use crate::services::field::{CreateFieldInput, FieldService, UpdateFieldInput};
use crate::AppState;

/// List all fields of the current user
pub async fn list_fields(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> impl IntoResponse {
    let service = FieldService::new(state.store.clone());

    match service.get_fields(current_user.0.user_id).await {
        Ok(fields) => (StatusCode::OK, Json(serde_json::json!({ "fields": fields }))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a specific field
pub async fn get_field(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(field_id): AppPath<Uuid>,
) -> impl IntoResponse {
    let service = FieldService::new(state.store.clone());

    match service.get_field(current_user.0.user_id, field_id).await {
        Ok(field) => (StatusCode::OK, Json(field)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Create a new field
pub async fn create_field(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppJson(input): AppJson<CreateFieldInput>,
) -> impl IntoResponse {
    let service = FieldService::new(state.store.clone());

    match service.create_field(current_user.0.user_id, input).await {
        Ok(field) => (StatusCode::CREATED, Json(field)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Update a field
pub async fn update_field(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(field_id): AppPath<Uuid>,
    AppJson(input): AppJson<UpdateFieldInput>,
) -> impl IntoResponse {
    let service = FieldService::new(state.store.clone());

    match service.update_field(current_user.0.user_id, field_id, input).await {
        Ok(field) => (StatusCode::OK, Json(field)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Delete a field together with its analyses
pub async fn delete_field(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(field_id): AppPath<Uuid>,
) -> impl IntoResponse {
    let service = FieldService::new(state.store.clone());

    match service.delete_field(current_user.0.user_id, field_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
