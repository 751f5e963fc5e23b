use crate::store::{SqliteStore, StatusCounts};
use anyhow::Result;
use serde::Serialize;

/// Dashboard counters for one organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgreementMetrics {
    pub agreement_count: i64,
    pub draft_count: i64,
    pub pending_count: i64,
    pub signed_count: i64,
    pub expired_count: i64,
}

impl From<StatusCounts> for AgreementMetrics {
    fn from(counts: StatusCounts) -> Self {
        Self {
            agreement_count: counts.total,
            draft_count: counts.draft,
            pending_count: counts.pending,
            signed_count: counts.signed,
            expired_count: counts.expired,
        }
    }
}

/// Counts for `organization_id`; a user without an organization sees zeroes.
pub async fn organization_metrics(
    store: &SqliteStore,
    organization_id: Option<&str>,
) -> Result<AgreementMetrics> {
    let Some(organization_id) = organization_id else {
        return Ok(AgreementMetrics::default());
    };
    Ok(store.status_counts(organization_id).await?.into())
}
