use super::super::{ApiError, AppState, CurrentUser};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct CreateOrganizationBody {
    #[serde(default)]
    pub name: String,
}

/// GET /api/organizations
pub(crate) async fn handle_get(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let not_member = || ApiError::NotFound("User is not part of an organization".into());
    let organization_id = user.0.organization_id.as_deref().ok_or_else(not_member)?;
    let organization = state
        .store
        .get_organization(organization_id)
        .await?
        .ok_or_else(not_member)?;
    Ok(Json(organization))
}

/// POST /api/organizations -- create an organization and move the caller into it
pub(crate) async fn handle_create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<CreateOrganizationBody>,
) -> Result<impl IntoResponse, ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Organization name is required"));
    }

    let (organization, user) = state
        .store
        .create_organization_for_user(&user.0.id, name)
        .await?;
    tracing::info!(organization_id = %organization.id, user_id = %user.id, "organization created");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "org": organization, "user": user })),
    ))
}

/// POST /api/organizations/default -- idempotent "<name>'s Organization"
pub(crate) async fn handle_default(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let (organization, created) = state.store.ensure_default_organization(&user).await?;
    if !created {
        return Ok((StatusCode::OK, Json(serde_json::json!(organization))));
    }

    let user = state
        .store
        .get_user(&user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    tracing::info!(organization_id = %organization.id, user_id = %user.id, "default organization created");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "org": organization, "user": user })),
    ))
}
