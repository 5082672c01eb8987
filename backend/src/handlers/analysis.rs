//! Analysis handlers

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::CurrentUser;
use crate::services::analysis::{AnalysisService, AnalyzeRequest, AnalyzeResponse};
use crate::AppState;

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub format: Option<String>, // "json" or "csv"
}

/// Run an analysis for one of the caller's fields
pub async fn analyze(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppJson(request): AppJson<AnalyzeRequest>,
) -> AppResult<Json<AnalyzeResponse>> {
    let response = state.analysis.analyze(current_user.0.user_id, request).await?;
    Ok(Json(response))
}

/// Analysis history of a field
pub async fn list_analyses(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(field_id): AppPath<Uuid>,
    AppQuery(query): AppQuery<HistoryQuery>,
) -> AppResult<Response> {
    let analyses = state
        .analysis
        .history(current_user.0.user_id, field_id, query.limit)
        .await?;

    if query.format.as_deref() == Some("csv") {
        let csv = AnalysisService::export_to_csv(&analyses)?;
        return Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"analyses.csv\""),
            ],
            csv,
        )
            .into_response());
    }

    Ok(Json(serde_json::json!({ "analyses": analyses })).into_response())
}
