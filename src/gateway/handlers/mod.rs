//! Route handlers, grouped by resource.

pub(super) mod agreements;
pub(super) mod auth;
pub(super) mod docusign;
pub(super) mod insights;
pub(super) mod organizations;
pub(super) mod status_stream;
pub(super) mod webhook;

use super::{ApiError, AppState, CurrentUser};
use crate::store::Agreement;
use axum::{extract::State, http::StatusCode, response::Json};

/// Load an agreement the caller's organization owns. Missing and foreign
/// agreements are indistinguishable to the caller.
pub(super) async fn owned_agreement(
    state: &AppState,
    user: &CurrentUser,
    id: &str,
) -> Result<Agreement, ApiError> {
    let organization_id = user.organization_id()?;
    match state.store.get_agreement(id).await? {
        Some(agreement) if agreement.organization_id == organization_id => Ok(agreement),
        _ => Err(ApiError::not_found("Agreement")),
    }
}

/// GET /health -- liveness plus a database probe
pub(super) async fn handle_health(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let esign_authorized = state.esign.is_authorized().await;
    match state.store.count_users().await {
        Ok(users) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "database": "connected",
                "users": users,
                "esign": state.esign.name(),
                "esignAuthorized": esign_authorized,
                "analysis": state.analyzer.is_configured(),
            })),
        ),
        Err(error) => {
            tracing::error!(error = %format!("{error:#}"), "health check database probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({"status": "error", "database": "unavailable"})),
            )
        }
    }
}
