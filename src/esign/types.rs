//! DocuSign OAuth and eSignature REST wire types.

use super::{EnvelopeStatus, SignerUpdate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── OAuth ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub accounts: Vec<UserInfoAccount>,
}

#[derive(Debug, Deserialize)]
pub struct UserInfoAccount {
    pub account_id: String,
    #[serde(default)]
    pub is_default: bool,
}

impl UserInfo {
    /// The default account, else the first listed.
    pub fn preferred_account_id(&self) -> Option<&str> {
        self.accounts
            .iter()
            .find(|account| account.is_default)
            .or_else(|| self.accounts.first())
            .map(|account| account.account_id.as_str())
    }
}

// ── Envelope creation ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeDefinition {
    pub email_subject: String,
    pub documents: Vec<Document>,
    pub recipients: Recipients,
    pub status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub document_base64: String,
    pub name: String,
    pub file_extension: String,
    pub document_id: String,
}

#[derive(Debug, Serialize)]
pub struct Recipients {
    pub signers: Vec<Signer>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Signer {
    pub email: String,
    pub name: String,
    pub recipient_id: String,
    pub routing_order: String,
    pub client_user_id: String,
    pub tabs: Tabs,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tabs {
    pub sign_here_tabs: Vec<SignHereTab>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignHereTab {
    pub document_id: String,
    pub page_number: String,
    pub x_position: String,
    pub y_position: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeSummary {
    pub envelope_id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientViewRequest {
    pub authentication_method: String,
    pub client_user_id: String,
    pub recipient_id: String,
    pub return_url: String,
    pub user_name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct RecipientView {
    pub url: String,
}

// ── Envelope status (REST lookup and Connect webhook) ───────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEnvelope {
    #[serde(default)]
    pub envelope_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub recipients: Option<WireRecipients>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WireRecipients {
    #[serde(default)]
    pub signers: Vec<WireSigner>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSigner {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub signed_date_time: Option<String>,
    #[serde(default)]
    pub declined_date_time: Option<String>,
}

/// DocuSign Connect JSON (SIM) payload. Older Connect configurations name
/// the envelope object `envelopeStatus`; current ones `envelopeSummary`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectPayload {
    #[serde(default)]
    pub event: Option<String>,
    pub data: ConnectData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectData {
    #[serde(default)]
    pub envelope_id: Option<String>,
    #[serde(alias = "envelopeSummary")]
    pub envelope_status: WireEnvelope,
}

fn parse_provider_time(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|value| DateTime::parse_from_rfc3339(value).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
}

impl WireEnvelope {
    /// Normalize to [`EnvelopeStatus`]; `fallback_id` covers payloads that
    /// carry the id outside the envelope object. `None` when no id is known.
    pub fn into_status(self, fallback_id: Option<String>) -> Option<EnvelopeStatus> {
        let envelope_id = self.envelope_id.or(fallback_id)?;
        let signers = self
            .recipients
            .unwrap_or_default()
            .signers
            .into_iter()
            .map(|signer| SignerUpdate {
                occurred_at: parse_provider_time(
                    signer
                        .signed_date_time
                        .as_deref()
                        .or(signer.declined_date_time.as_deref()),
                ),
                email: signer.email.unwrap_or_default(),
                status: signer.status.unwrap_or_default(),
            })
            .collect();

        Some(EnvelopeStatus {
            envelope_id,
            status: self.status.unwrap_or_else(|| "unknown".into()),
            signers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_definition_uses_docusign_field_names() {
        let definition = EnvelopeDefinition {
            email_subject: "Please sign: NDA".into(),
            documents: vec![Document {
                document_base64: "PHA+".into(),
                name: "NDA".into(),
                file_extension: "html".into(),
                document_id: "1".into(),
            }],
            recipients: Recipients {
                signers: vec![Signer {
                    email: "a@example.com".into(),
                    name: "A".into(),
                    recipient_id: "1".into(),
                    routing_order: "1".into(),
                    client_user_id: "agr-1".into(),
                    tabs: Tabs {
                        sign_here_tabs: vec![SignHereTab {
                            document_id: "1".into(),
                            page_number: "1".into(),
                            x_position: "200".into(),
                            y_position: "200".into(),
                        }],
                    },
                }],
            },
            status: "sent".into(),
        };

        let json = serde_json::to_value(&definition).unwrap();
        assert_eq!(json["emailSubject"], "Please sign: NDA");
        assert_eq!(json["documents"][0]["documentBase64"], "PHA+");
        assert_eq!(json["recipients"]["signers"][0]["clientUserId"], "agr-1");
        assert_eq!(
            json["recipients"]["signers"][0]["tabs"]["signHereTabs"][0]["xPosition"],
            "200"
        );
    }

    #[test]
    fn connect_payload_accepts_both_envelope_keys() {
        let legacy = r#"{"event":"envelope-completed","data":{"envelopeStatus":{"envelopeId":"e1","status":"completed","recipients":{"signers":[{"email":"a@example.com","status":"completed","signedDateTime":"2026-01-02T03:04:05.1234567Z"}]}}}}"#;
        let current = r#"{"event":"envelope-completed","data":{"envelopeId":"e1","envelopeSummary":{"status":"completed"}}}"#;

        let legacy: ConnectPayload = serde_json::from_str(legacy).unwrap();
        let status = legacy.data.envelope_status.into_status(None).unwrap();
        assert_eq!(status.envelope_id, "e1");
        assert_eq!(status.signers.len(), 1);
        assert!(status.signers[0].occurred_at.is_some());

        let current: ConnectPayload = serde_json::from_str(current).unwrap();
        let fallback = current.data.envelope_id.clone();
        let status = current.data.envelope_status.into_status(fallback).unwrap();
        assert_eq!(status.envelope_id, "e1");
        assert!(status.signers.is_empty());
    }

    #[test]
    fn declined_time_is_used_when_not_signed() {
        let envelope: WireEnvelope = serde_json::from_str(
            r#"{"envelopeId":"e2","status":"declined","recipients":{"signers":[{"email":"b@example.com","status":"declined","declinedDateTime":"2026-02-01T00:00:00Z"}]}}"#,
        )
        .unwrap();
        let status = envelope.into_status(None).unwrap();
        assert_eq!(
            status.signers[0].occurred_at.map(|t| t.to_rfc3339()),
            Some("2026-02-01T00:00:00+00:00".to_string())
        );
    }

    #[test]
    fn envelope_without_any_id_is_dropped() {
        let envelope: WireEnvelope = serde_json::from_str(r#"{"status":"sent"}"#).unwrap();
        assert!(envelope.into_status(None).is_none());
    }

    #[test]
    fn userinfo_prefers_default_account() {
        let info: UserInfo = serde_json::from_str(
            r#"{"accounts":[{"account_id":"first","is_default":false},{"account_id":"main","is_default":true}]}"#,
        )
        .unwrap();
        assert_eq!(info.preferred_account_id(), Some("main"));
    }
}
