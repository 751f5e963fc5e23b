use super::super::{ApiError, AppState};
use crate::esign::webhook::{SIGNATURE_HEADER, parse_payload, verify_signature};
use crate::signing;
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Json,
};

/// POST /api/docusign/webhook -- DocuSign Connect envelope callback
pub(crate) async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    // ── Security: HMAC over the raw body, checked before parsing ──
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let secret = state.config.docusign.webhook_secret.as_deref();
    if !verify_signature(secret, &body, signature) {
        tracing::warn!(
            "DocuSign webhook rejected (signature: {}, secret: {})",
            if signature.is_some() { "invalid" } else { "missing" },
            if secret.is_some() { "set" } else { "unset" }
        );
        return Err(ApiError::Unauthorized("Invalid signature".into()));
    }

    let envelope = parse_payload(&body).map_err(|error| {
        tracing::warn!(error = %format!("{error:#}"), "DocuSign webhook payload rejected");
        ApiError::bad_request("Invalid webhook payload")
    })?;

    let outcome = signing::apply_envelope_update(&state.store, &envelope).await?;
    tracing::info!(
        envelope_id = %envelope.envelope_id,
        envelope_status = %envelope.status,
        updated = outcome.updated,
        signed = outcome.agreements_signed.len(),
        "DocuSign webhook processed"
    );
    Ok(Json(serde_json::json!({ "success": true })))
}
