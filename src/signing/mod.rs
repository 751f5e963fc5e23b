//! Signature request orchestration and status reconciliation.

pub mod reconcile;
#[cfg(test)]
pub(crate) mod testing;

pub use reconcile::{ReconcileOutcome, apply_envelope_update, sync_agreement};

use crate::error::SigningError;
use crate::esign::{SignatureProvider, SigningRequest, SigningSession};
use crate::store::{Agreement, AgreementStatus, Signature, SqliteStore};
use anyhow::Result;

/// Route `agreement` to one signer: create the provider envelope, then
/// upsert the signer row (and flip a draft to pending) in one transaction.
pub async fn request_signature(
    store: &SqliteStore,
    provider: &dyn SignatureProvider,
    agreement: &Agreement,
    signer_email: &str,
    signer_name: &str,
) -> Result<(Signature, SigningSession)> {
    let signer_email = signer_email.trim();
    let signer_name = signer_name.trim();
    if signer_email.is_empty() || signer_name.is_empty() {
        return Err(SigningError::MissingSigner.into());
    }
    if matches!(
        agreement.status,
        AgreementStatus::Signed | AgreementStatus::Expired
    ) {
        return Err(SigningError::NotSignable {
            status: agreement.status.to_string(),
        }
        .into());
    }

    let session = provider
        .create_signing_request(&SigningRequest {
            agreement_id: agreement.id.clone(),
            signer_email: signer_email.to_string(),
            signer_name: signer_name.to_string(),
            document_name: agreement.title.clone(),
            document_content: agreement.content.clone(),
        })
        .await?;

    let signature = store
        .record_signature_request(&agreement.id, signer_email, signer_name, &session.envelope_id)
        .await?;

    tracing::info!(
        agreement_id = %agreement.id,
        envelope_id = %session.envelope_id,
        provider = provider.name(),
        "signature requested"
    );
    Ok((signature, session))
}
