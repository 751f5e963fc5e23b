use super::super::{ApiError, AppState, CurrentUser};
use axum::{
    extract::{Query, State},
    response::{Json, Redirect},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn error_redirect(app_url: &str, message: &str) -> Redirect {
    let encoded: String = url::form_urlencoded::byte_serialize(message.as_bytes()).collect();
    Redirect::to(&format!("{app_url}/error?message={encoded}"))
}

/// GET /api/docusign/authorize -- `{url}` to send the browser to
pub(crate) async fn handle_authorize(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let url = state.esign.authorization_url()?;
    Ok(Json(serde_json::json!({ "url": url })))
}

/// GET /api/docusign/callback -- OAuth redirect target. Always answers
/// with a redirect back into the app.
pub(crate) async fn handle_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    let app_url = state.config.app_base_url();

    if let Some(error) = query.error.as_deref() {
        tracing::warn!(provider = state.esign.name(), %error, "authorization denied");
        return error_redirect(app_url, "DocuSign authorization was denied");
    }
    let (Some(code), Some(oauth_state)) = (query.code.as_deref(), query.state.as_deref()) else {
        return error_redirect(app_url, "Missing authorization code");
    };

    match state.esign.complete_authorization(code, oauth_state).await {
        Ok(()) => {
            tracing::info!(provider = state.esign.name(), "authorization completed");
            Redirect::to(&format!("{app_url}/agreements?docusign=connected"))
        }
        Err(error) => {
            tracing::warn!(
                provider = state.esign.name(),
                error = %format!("{error:#}"),
                "authorization callback failed"
            );
            error_redirect(app_url, "Failed to connect DocuSign")
        }
    }
}
