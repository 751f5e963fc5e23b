//! Applies provider-reported signer status to stored signatures and
//! recomputes agreement status by full scan.

use crate::esign::{EnvelopeStatus, SignatureProvider};
use crate::store::{Signature, SignatureStatus, SqliteStore};
use anyhow::Result;
use chrono::Utc;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Signature rows moved out of pending.
    pub updated: usize,
    /// Terminal updates aimed at rows that were already terminal.
    pub ignored_terminal: usize,
    /// Terminal updates with no matching tracked row.
    pub unmatched: usize,
    /// Agreements that became signed during this pass.
    pub agreements_signed: Vec<String>,
}

impl ReconcileOutcome {
    fn merge(&mut self, other: Self) {
        self.updated += other.updated;
        self.ignored_terminal += other.ignored_terminal;
        self.unmatched += other.unmatched;
        self.agreements_signed.extend(other.agreements_signed);
    }
}

/// Match a signer to a tracked row by email; an envelope with a single
/// tracked row matches any signer.
fn match_row<'a>(rows: &'a [Signature], email: &str) -> Option<&'a Signature> {
    rows.iter()
        .find(|row| row.signer_email.eq_ignore_ascii_case(email.trim()))
        .or_else(|| match rows {
            [only] => Some(only),
            _ => None,
        })
}

pub async fn apply_envelope_update(
    store: &SqliteStore,
    envelope: &EnvelopeStatus,
) -> Result<ReconcileOutcome> {
    let mut outcome = ReconcileOutcome::default();
    let rows = store.signatures_for_envelope(&envelope.envelope_id).await?;
    if rows.is_empty() {
        tracing::info!(envelope_id = %envelope.envelope_id, "no tracked signatures for envelope");
        return Ok(outcome);
    }

    for signer in &envelope.signers {
        let Some(status) = signer.terminal_status() else {
            tracing::debug!(
                envelope_id = %envelope.envelope_id,
                status = %signer.status,
                "in-flight signer status ignored"
            );
            continue;
        };
        let Some(row) = match_row(&rows, &signer.email) else {
            outcome.unmatched += 1;
            tracing::warn!(envelope_id = %envelope.envelope_id, "signer update matches no tracked row");
            continue;
        };

        let signed_at = match status {
            SignatureStatus::Completed => Some(signer.occurred_at.unwrap_or_else(Utc::now)),
            _ => signer.occurred_at,
        };
        if store.advance_signature(&row.id, status, signed_at).await? {
            outcome.updated += 1;
            tracing::info!(
                signature_id = %row.id,
                agreement_id = %row.agreement_id,
                %status,
                "signature status advanced"
            );
        } else {
            outcome.ignored_terminal += 1;
            tracing::warn!(
                signature_id = %row.id,
                current = %row.status,
                requested = %status,
                "update for terminal signature ignored"
            );
        }
    }

    let agreements: BTreeSet<&str> = rows.iter().map(|row| row.agreement_id.as_str()).collect();
    for agreement_id in agreements {
        if store.mark_signed_if_complete(agreement_id).await? {
            tracing::info!(%agreement_id, "all signatures completed; agreement signed");
            outcome.agreements_signed.push(agreement_id.to_string());
        }
    }

    Ok(outcome)
}

/// Poll the provider for every envelope attached to `agreement_id` and apply
/// what it reports.
pub async fn sync_agreement(
    store: &SqliteStore,
    provider: &dyn SignatureProvider,
    agreement_id: &str,
) -> Result<ReconcileOutcome> {
    let envelope_ids: BTreeSet<String> = store
        .signatures_for_agreement(agreement_id)
        .await?
        .into_iter()
        .filter(|signature| !signature.status.is_terminal())
        .filter_map(|signature| signature.envelope_id)
        .collect();

    let mut outcome = ReconcileOutcome::default();
    for envelope_id in envelope_ids {
        let envelope = provider.envelope_status(&envelope_id).await?;
        outcome.merge(apply_envelope_update(store, &envelope).await?);
    }
    Ok(outcome)
}
