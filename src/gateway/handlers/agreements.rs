use super::super::{ApiError, AppState, CurrentUser};
use super::owned_agreement;
use crate::signing;
use crate::store::NewAgreement;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateAgreementBody {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignBody {
    #[serde(default)]
    pub signer_email: String,
    #[serde(default)]
    pub signer_name: String,
}

/// GET /api/agreements
pub(crate) async fn handle_list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let organization_id = user.organization_id()?;
    let agreements = state
        .store
        .list_agreements_with_signatures(organization_id)
        .await?;
    Ok(Json(serde_json::json!({ "data": agreements })))
}

/// POST /api/agreements
pub(crate) async fn handle_create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<CreateAgreementBody>,
) -> Result<impl IntoResponse, ApiError> {
    let organization_id = user.organization_id()?.to_string();
    let title = body.title.trim();
    if title.is_empty() || body.content.trim().is_empty() {
        return Err(ApiError::bad_request("Title and content are required"));
    }

    let agreement = state
        .store
        .create_agreement(NewAgreement {
            title: title.to_string(),
            content: body.content,
            organization_id,
            created_by: Some(user.0.id.clone()),
            expires_at: body.expires_at,
        })
        .await?;

    tracing::info!(agreement_id = %agreement.id, user_id = %user.0.id, "agreement created");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": agreement })),
    ))
}

/// GET /api/agreements/{id}
pub(crate) async fn handle_detail(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let agreement = owned_agreement(&state, &user, &id).await?;
    let detail = state
        .store
        .get_agreement_detail(&agreement.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Agreement"))?;
    Ok(Json(detail))
}

/// POST /api/agreements/{id}/sign
pub(crate) async fn handle_sign(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<SignBody>,
) -> Result<impl IntoResponse, ApiError> {
    let agreement = owned_agreement(&state, &user, &id).await?;
    let (signature, session) = signing::request_signature(
        &state.store,
        state.esign.as_ref(),
        &agreement,
        &body.signer_email,
        &body.signer_name,
    )
    .await?;

    Ok(Json(serde_json::json!({
        "signature": signature,
        "redirectUrl": session.redirect_url,
    })))
}

/// POST /api/agreements/{id}/sync -- poll the provider instead of waiting
/// for the webhook.
pub(crate) async fn handle_sync(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let agreement = owned_agreement(&state, &user, &id).await?;
    let outcome = signing::sync_agreement(&state.store, state.esign.as_ref(), &agreement.id).await?;
    let detail = state
        .store
        .get_agreement_detail(&agreement.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Agreement"))?;

    Ok(Json(serde_json::json!({
        "updated": outcome.updated,
        "agreement": detail,
    })))
}

/// POST /api/agreements/{id}/analyze
pub(crate) async fn handle_analyze(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let agreement = owned_agreement(&state, &user, &id).await?;
    let result = state.analyzer.analyze(&agreement.content).await?;
    let analysis = state.store.upsert_analysis(&agreement.id, &result).await?;

    tracing::info!(
        agreement_id = %agreement.id,
        provider = state.analyzer.name(),
        category = %analysis.result.category,
        "agreement analyzed"
    );
    Ok(Json(analysis))
}
