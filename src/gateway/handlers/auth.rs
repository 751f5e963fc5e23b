use super::super::session::{cleared_cookie, session_cookie, session_token};
use super::super::{ApiError, AppState, CurrentUser};
use crate::auth::{self, Registration};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, alias = "organization")]
    pub organization_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginBody {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/auth/register
pub(crate) async fn handle_register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, organization) = auth::register(
        &state.store,
        Registration {
            name: body.name,
            email: body.email,
            password: body.password,
            organization_name: body.organization_name,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "user": user, "organization": organization })),
    ))
}

/// POST /api/auth/login -- sets the session cookie and returns the token
/// for non-browser clients.
pub(crate) async fn handle_login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = auth::login(
        &state.store,
        &body.email,
        &body.password,
        state.config.session.ttl(),
    )
    .await?;

    let mut headers = HeaderMap::new();
    if let Some(cookie) = session_cookie(&state.config.session, &outcome.token) {
        headers.insert(header::SET_COOKIE, cookie);
    }
    let body = serde_json::json!({
        "user": outcome.user,
        "token": outcome.token,
        "expiresAt": outcome.expires_at,
    });
    Ok((StatusCode::OK, headers, Json(body)))
}

/// POST /api/auth/logout
pub(crate) async fn handle_logout(
    State(state): State<AppState>,
    _user: CurrentUser,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = session_token(&headers, &state.config.session.cookie_name) {
        auth::logout(&state.store, token).await?;
    }

    let mut response_headers = HeaderMap::new();
    if let Some(cookie) = cleared_cookie(&state.config.session) {
        response_headers.insert(header::SET_COOKIE, cookie);
    }
    Ok((response_headers, Json(serde_json::json!({ "success": true }))))
}

/// GET /api/auth/me
pub(crate) async fn handle_me(CurrentUser(user): CurrentUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "user": user }))
}
