//! DocuSign Connect HMAC verification and payload decoding.

use super::EnvelopeStatus;
use super::types::ConnectPayload;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

pub const SIGNATURE_HEADER: &str = "X-DocuSign-Signature-1";

/// base64(HMAC-SHA256(secret, body)).
pub fn compute_signature(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Verify the Connect signature header against the raw body.
///
/// A missing secret, missing or blank header, or mismatch all fail.
pub fn verify_signature(secret: Option<&str>, body: &[u8], header: Option<&str>) -> bool {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        return false;
    };
    let Some(header) = header.map(str::trim).filter(|h| !h.is_empty()) else {
        return false;
    };
    let Some(expected) = compute_signature(secret, body) else {
        return false;
    };
    expected.as_bytes().ct_eq(header.as_bytes()).into()
}

/// Decode a Connect payload into the envelope status it reports.
pub fn parse_payload(body: &[u8]) -> anyhow::Result<EnvelopeStatus> {
    let payload: ConnectPayload = serde_json::from_slice(body)?;
    if let Some(event) = payload.event.as_deref() {
        tracing::debug!(event, "docusign connect event");
    }
    payload
        .data
        .envelope_status
        .into_status(payload.data.envelope_id)
        .ok_or_else(|| anyhow::anyhow!("connect payload carries no envelope id"))
}
