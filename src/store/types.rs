use crate::analysis::AnalysisResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

// Agreement lifecycle: draft, pending, signed. Expired is terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AgreementStatus {
    Draft,
    Pending,
    Signed,
    Expired,
}

// Per-signer state; only moves forward out of Pending.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SignatureStatus {
    Pending,
    Completed,
    Declined,
}

impl SignatureStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "orgId")]
    pub organization_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Stored login material, kept apart from [`User`] so it never serializes.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    /// Creates and joins a fresh organization with this name.
    pub organization_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agreement {
    pub id: String,
    pub title: String,
    pub content: String,
    pub status: AgreementStatus,
    #[serde(rename = "orgId")]
    pub organization_id: String,
    pub created_by: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAgreement {
    pub title: String,
    pub content: String,
    pub organization_id: String,
    pub created_by: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub id: String,
    pub agreement_id: String,
    pub signer_email: String,
    pub signer_name: String,
    pub status: SignatureStatus,
    pub signed_at: Option<DateTime<Utc>>,
    #[serde(rename = "docuSignEnvelopeId")]
    pub envelope_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Trimmed signature view embedded in agreement listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureSummary {
    pub id: String,
    pub status: SignatureStatus,
    pub signed_at: Option<DateTime<Utc>>,
}

impl From<&Signature> for SignatureSummary {
    fn from(signature: &Signature) -> Self {
        Self {
            id: signature.id.clone(),
            status: signature.status,
            signed_at: signature.signed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    pub id: String,
    pub agreement_id: String,
    #[serde(flatten)]
    pub result: AnalysisResult,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgreementListItem {
    #[serde(flatten)]
    pub agreement: Agreement,
    pub signatures: Vec<SignatureSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgreementDetail {
    #[serde(flatten)]
    pub agreement: Agreement,
    pub signatures: Vec<Signature>,
    pub ai_analysis: Option<AiAnalysis>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub token_hash: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Agreement counts by status for one organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: i64,
    pub draft: i64,
    pub pending: i64,
    pub signed: i64,
    pub expired: i64,
}
