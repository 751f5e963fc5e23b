use super::{ApiError, AppState};
use crate::auth;
use crate::config::SessionConfig;
use crate::store::User;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, header, request::Parts},
};

/// Signed-in user resolved from the session cookie or a bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    /// Organization the caller acts within, or a `NO_ORGANIZATION` error.
    pub fn organization_id(&self) -> Result<&str, ApiError> {
        self.0
            .organization_id
            .as_deref()
            .ok_or_else(ApiError::no_organization)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| raw.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// Session token from the cookie, falling back to `Authorization: Bearer`.
pub(super) fn session_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    cookie_value(headers, cookie_name).or_else(|| bearer_token(headers))
}

pub(super) fn session_cookie(config: &SessionConfig, token: &str) -> Option<HeaderValue> {
    let max_age = config.ttl().num_seconds();
    let secure = if config.secure_cookie { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}{secure}",
        config.cookie_name
    ))
    .ok()
}

pub(super) fn cleared_cookie(config: &SessionConfig) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        config.cookie_name
    ))
    .ok()
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = session_token(&parts.headers, &state.config.session.cookie_name)
            .ok_or_else(ApiError::unauthorized)?;
        auth::authenticate(&state.store, token)
            .await?
            .map(CurrentUser)
            .ok_or_else(ApiError::unauthorized)
    }
}
