//! Activity log handlers

use axum::{extract::State, Json};
use serde::Deserialize;
use shared::ActivityLogEntry;

use crate::error::AppResult;
use crate::extract::AppQuery;
use crate::middleware::CurrentUser;
use crate::services::activity::ActivityService;
use crate::AppState;

#[derive(Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
}

/// Most recent activity of the current user
pub async fn list_activity(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppQuery(query): AppQuery<ActivityQuery>,
) -> AppResult<Json<Vec<ActivityLogEntry>>> {
    let service = ActivityService::new(state.store.clone());
    let entries = service.recent(current_user.0.user_id, query.limit).await?;
    Ok(Json(entries))
}
