//! E-signature provider seam and the DocuSign implementation.

pub mod docusign;
mod pending;
pub mod pkce;
pub mod types;
pub mod webhook;

pub use docusign::DocuSignClient;
pub use pending::PendingAuthorizations;

use crate::store::SignatureStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Document to route for signature.
#[derive(Debug, Clone)]
pub struct SigningRequest {
    pub agreement_id: String,
    pub signer_email: String,
    pub signer_name: String,
    pub document_name: String,
    pub document_content: String,
}

/// Created envelope plus the embedded signing URL for the signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningSession {
    pub envelope_id: String,
    pub redirect_url: String,
}

/// One signer's state as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerUpdate {
    pub email: String,
    /// Raw provider status (`sent`, `delivered`, `completed`, `declined`, ...).
    pub status: String,
    /// Signed or declined time, when reported.
    pub occurred_at: Option<DateTime<Utc>>,
}

impl SignerUpdate {
    /// Map the provider status onto a tracked terminal status. In-flight
    /// statuses map to `None` and leave the stored row untouched.
    pub fn terminal_status(&self) -> Option<SignatureStatus> {
        match self.status.trim().to_ascii_lowercase().as_str() {
            "completed" | "signed" => Some(SignatureStatus::Completed),
            "declined" => Some(SignatureStatus::Declined),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeStatus {
    pub envelope_id: String,
    pub status: String,
    pub signers: Vec<SignerUpdate>,
}

/// Provider integration used by the signing orchestrator and the OAuth
/// routes. Errors carry [`crate::error::EsignError`] where the caller needs
/// to tell configuration and authorization problems apart from upstream
/// failures.
#[async_trait]
pub trait SignatureProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Start an OAuth authorization; returns the URL to send the user to.
    fn authorization_url(&self) -> anyhow::Result<String>;

    /// Finish the OAuth flow started by [`Self::authorization_url`].
    async fn complete_authorization(&self, code: &str, state: &str) -> anyhow::Result<()>;

    async fn is_authorized(&self) -> bool;

    async fn create_signing_request(
        &self,
        request: &SigningRequest,
    ) -> anyhow::Result<SigningSession>;

    async fn envelope_status(&self, envelope_id: &str) -> anyhow::Result<EnvelopeStatus>;
}
