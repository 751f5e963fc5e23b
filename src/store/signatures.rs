use super::types::{Signature, SignatureStatus};
use super::{SqliteStore, parse_enum, parse_optional_timestamp, parse_timestamp, timestamp};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

const TABLE: &str = "signatures";
const SIGNATURE_COLUMNS: &str = "s.id AS id, s.agreement_id AS agreement_id, \
     s.signer_email AS signer_email, s.signer_name AS signer_name, s.status AS status, \
     s.signed_at AS signed_at, s.envelope_id AS envelope_id, \
     s.created_at AS created_at, s.updated_at AS updated_at";

fn map_signature_row(row: &SqliteRow) -> Result<Signature> {
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Signature {
        id: row.try_get("id")?,
        agreement_id: row.try_get("agreement_id")?,
        signer_email: row.try_get("signer_email")?,
        signer_name: row.try_get("signer_name")?,
        status: parse_enum(TABLE, &status)?,
        signed_at: parse_optional_timestamp(TABLE, row.try_get("signed_at")?)?,
        envelope_id: row.try_get("envelope_id")?,
        created_at: parse_timestamp(TABLE, &created_at)?,
        updated_at: parse_timestamp(TABLE, &updated_at)?,
    })
}

impl SqliteStore {
    /// Upsert the signer's row back to `pending` with the new envelope and
    /// move a draft agreement to pending, in one transaction.
    pub async fn record_signature_request(
        &self,
        agreement_id: &str,
        signer_email: &str,
        signer_name: &str,
        envelope_id: &str,
    ) -> Result<Signature> {
        let now = timestamp(Utc::now());
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "INSERT INTO signatures
                 (id, agreement_id, signer_email, signer_name, status, signed_at, envelope_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, 'pending', NULL, $5, $6, $6)
             ON CONFLICT(agreement_id, signer_email) DO UPDATE SET
                 signer_name = excluded.signer_name,
                 status = 'pending',
                 signed_at = NULL,
                 envelope_id = excluded.envelope_id,
                 updated_at = excluded.updated_at
             RETURNING id, agreement_id, signer_email, signer_name, status,
                       signed_at, envelope_id, created_at, updated_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(agreement_id)
        .bind(signer_email)
        .bind(signer_name)
        .bind(envelope_id)
        .bind(&now)
        .fetch_one(&mut *tx)
        .await
        .context("upsert signature")?;
        let signature = map_signature_row(&row)?;

        sqlx::query(
            "UPDATE agreements
             SET status = 'pending', updated_at = $2
             WHERE id = $1 AND status = 'draft'",
        )
        .bind(agreement_id)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .context("move agreement to pending")?;

        tx.commit().await?;
        Ok(signature)
    }

    pub async fn signatures_for_agreement(&self, agreement_id: &str) -> Result<Vec<Signature>> {
        let rows = sqlx::query(&format!(
            "SELECT {SIGNATURE_COLUMNS}
             FROM signatures s
             WHERE s.agreement_id = $1
             ORDER BY s.created_at ASC, s.rowid ASC"
        ))
        .bind(agreement_id)
        .fetch_all(&self.pool)
        .await
        .context("list signatures for agreement")?;

        rows.iter().map(map_signature_row).collect()
    }

    pub(super) async fn signatures_for_organization(
        &self,
        organization_id: &str,
    ) -> Result<Vec<Signature>> {
        let rows = sqlx::query(&format!(
            "SELECT {SIGNATURE_COLUMNS}
             FROM signatures s
             JOIN agreements a ON a.id = s.agreement_id
             WHERE a.organization_id = $1
             ORDER BY s.created_at ASC, s.rowid ASC"
        ))
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await
        .context("list signatures for organization")?;

        rows.iter().map(map_signature_row).collect()
    }

    pub async fn signatures_for_envelope(&self, envelope_id: &str) -> Result<Vec<Signature>> {
        let rows = sqlx::query(&format!(
            "SELECT {SIGNATURE_COLUMNS}
             FROM signatures s
             WHERE s.envelope_id = $1
             ORDER BY s.created_at ASC, s.rowid ASC"
        ))
        .bind(envelope_id)
        .fetch_all(&self.pool)
        .await
        .context("list signatures for envelope")?;

        rows.iter().map(map_signature_row).collect()
    }

    /// Move a pending signature to a terminal status. Rows already in a
    /// terminal status are left alone and `false` is returned.
    pub async fn advance_signature(
        &self,
        signature_id: &str,
        status: SignatureStatus,
        signed_at: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        anyhow::ensure!(
            status.is_terminal(),
            "signature can only advance to a terminal status, got {status}"
        );

        let result = sqlx::query(
            "UPDATE signatures
             SET status = $2, signed_at = $3, updated_at = $4
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(signature_id)
        .bind(status.as_ref())
        .bind(signed_at.map(timestamp))
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .context("advance signature status")?;

        Ok(result.rows_affected() > 0)
    }
}
