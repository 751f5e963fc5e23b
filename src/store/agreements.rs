use super::types::{
    Agreement, AgreementDetail, AgreementListItem, AgreementStatus, NewAgreement, Signature,
    SignatureSummary, StatusCounts,
};
use super::{SqliteStore, parse_enum, parse_optional_timestamp, parse_timestamp, timestamp};
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use std::collections::HashMap;
use uuid::Uuid;

const TABLE: &str = "agreements";
const AGREEMENT_COLUMNS: &str =
    "id, title, content, status, organization_id, created_by, expires_at, created_at, updated_at";

fn map_agreement_row(row: &SqliteRow) -> Result<Agreement> {
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Agreement {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        status: parse_enum(TABLE, &status)?,
        organization_id: row.try_get("organization_id")?,
        created_by: row.try_get("created_by")?,
        expires_at: parse_optional_timestamp(TABLE, row.try_get("expires_at")?)?,
        created_at: parse_timestamp(TABLE, &created_at)?,
        updated_at: parse_timestamp(TABLE, &updated_at)?,
    })
}

impl SqliteStore {
    /// New agreements always start as drafts.
    pub async fn create_agreement(&self, new_agreement: NewAgreement) -> Result<Agreement> {
        let now = Utc::now();
        let agreement = Agreement {
            id: Uuid::new_v4().to_string(),
            title: new_agreement.title,
            content: new_agreement.content,
            status: AgreementStatus::Draft,
            organization_id: new_agreement.organization_id,
            created_by: new_agreement.created_by,
            expires_at: new_agreement.expires_at,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO agreements
                 (id, title, content, status, organization_id, created_by, expires_at, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)",
        )
        .bind(&agreement.id)
        .bind(&agreement.title)
        .bind(&agreement.content)
        .bind(agreement.status.as_ref())
        .bind(&agreement.organization_id)
        .bind(&agreement.created_by)
        .bind(agreement.expires_at.map(timestamp))
        .bind(timestamp(now))
        .execute(&self.pool)
        .await
        .context("insert agreement")?;

        Ok(agreement)
    }

    pub async fn get_agreement(&self, id: &str) -> Result<Option<Agreement>> {
        let row = sqlx::query(&format!(
            "SELECT {AGREEMENT_COLUMNS} FROM agreements WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("query agreement by id")?;

        row.map(|r| map_agreement_row(&r)).transpose()
    }

    /// Agreement with its signatures and analysis, or `None` if missing.
    pub async fn get_agreement_detail(&self, id: &str) -> Result<Option<AgreementDetail>> {
        let Some(agreement) = self.get_agreement(id).await? else {
            return Ok(None);
        };
        let signatures = self.signatures_for_agreement(id).await?;
        let ai_analysis = self.get_analysis(id).await?;

        Ok(Some(AgreementDetail {
            agreement,
            signatures,
            ai_analysis,
        }))
    }

    /// Organization agreements, newest first.
    pub async fn list_agreements(&self, organization_id: &str) -> Result<Vec<Agreement>> {
        let rows = sqlx::query(&format!(
            "SELECT {AGREEMENT_COLUMNS}
             FROM agreements
             WHERE organization_id = $1
             ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await
        .context("list agreements")?;

        rows.iter().map(map_agreement_row).collect()
    }

    /// Organization agreements, newest first, each with a signature summary.
    pub async fn list_agreements_with_signatures(
        &self,
        organization_id: &str,
    ) -> Result<Vec<AgreementListItem>> {
        let agreements = self.list_agreements(organization_id).await?;
        let signatures = self.signatures_for_organization(organization_id).await?;

        let mut by_agreement: HashMap<String, Vec<SignatureSummary>> = HashMap::new();
        for signature in &signatures {
            by_agreement
                .entry(signature.agreement_id.clone())
                .or_default()
                .push(SignatureSummary::from(signature));
        }

        Ok(agreements
            .into_iter()
            .map(|agreement| {
                let signatures = by_agreement.remove(&agreement.id).unwrap_or_default();
                AgreementListItem {
                    agreement,
                    signatures,
                }
            })
            .collect())
    }

    pub async fn status_counts(&self, organization_id: &str) -> Result<StatusCounts> {
        let rows = sqlx::query(
            "SELECT status, COUNT(*) AS cnt
             FROM agreements
             WHERE organization_id = $1
             GROUP BY status",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await
        .context("count agreements by status")?;

        let mut counts = StatusCounts::default();
        for row in rows {
            let status: String = row.try_get("status")?;
            let count: i64 = row.try_get("cnt")?;
            counts.total += count;
            match parse_enum::<AgreementStatus>(TABLE, &status)? {
                AgreementStatus::Draft => counts.draft += count,
                AgreementStatus::Pending => counts.pending += count,
                AgreementStatus::Signed => counts.signed += count,
                AgreementStatus::Expired => counts.expired += count,
            }
        }
        Ok(counts)
    }

    /// Flip a pending agreement to signed when it has at least one signature
    /// and every signature is completed. Returns true when the flip happened.
    pub async fn mark_signed_if_complete(&self, agreement_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE agreements
             SET status = 'signed', updated_at = $2
             WHERE id = $1
               AND status = 'pending'
               AND EXISTS (SELECT 1 FROM signatures WHERE agreement_id = $1)
               AND NOT EXISTS (
                   SELECT 1 FROM signatures
                   WHERE agreement_id = $1 AND status <> 'completed'
               )",
        )
        .bind(agreement_id)
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .context("mark agreement signed")?;

        Ok(result.rows_affected() > 0)
    }

    /// Status and signatures as relayed on the status stream.
    pub async fn agreement_status_snapshot(
        &self,
        agreement_id: &str,
    ) -> Result<Option<(AgreementStatus, Vec<Signature>)>> {
        let Some(agreement) = self.get_agreement(agreement_id).await? else {
            return Ok(None);
        };
        let signatures = self.signatures_for_agreement(agreement_id).await?;
        Ok(Some((agreement.status, signatures)))
    }
}
