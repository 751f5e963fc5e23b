use super::super::{ApiError, AppState, CurrentUser};
use crate::insights;
use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct AnalyzeBody {
    #[serde(default)]
    pub content: String,
}

/// GET /api/analytics/metrics
pub(crate) async fn handle_metrics(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let metrics =
        insights::organization_metrics(&state.store, user.organization_id.as_deref()).await?;
    Ok(Json(metrics))
}

/// GET /api/calendar/events
pub(crate) async fn handle_calendar(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let organization_id = user.organization_id()?;
    let events = insights::calendar_events(&state.store, organization_id, Utc::now()).await?;
    Ok(Json(events))
}

/// POST /api/ai/analyze -- analyze posted text without persisting it
pub(crate) async fn handle_adhoc_analyze(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(body): Json<AnalyzeBody>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.analyzer.analyze(&body.content).await?;
    Ok(Json(result))
}
