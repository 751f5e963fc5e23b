use super::types::AiAnalysis;
use super::{SqliteStore, parse_timestamp, timestamp};
use crate::analysis::AnalysisResult;
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

const TABLE: &str = "ai_analyses";

fn map_analysis_row(row: &SqliteRow) -> Result<AiAnalysis> {
    let key_terms: String = row.try_get("key_terms")?;
    let risks: String = row.try_get("risks")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(AiAnalysis {
        id: row.try_get("id")?,
        agreement_id: row.try_get("agreement_id")?,
        result: AnalysisResult {
            summary: row.try_get("summary")?,
            key_terms: serde_json::from_str(&key_terms).context("deserialize key_terms")?,
            risks: serde_json::from_str(&risks).context("deserialize risks")?,
            category: row.try_get("category")?,
            confidence_score: row.try_get("confidence_score")?,
        },
        created_at: parse_timestamp(TABLE, &created_at)?,
        updated_at: parse_timestamp(TABLE, &updated_at)?,
    })
}

impl SqliteStore {
    /// Insert or replace the single analysis attached to an agreement.
    pub async fn upsert_analysis(
        &self,
        agreement_id: &str,
        result: &AnalysisResult,
    ) -> Result<AiAnalysis> {
        let now = timestamp(Utc::now());
        let key_terms = serde_json::to_string(&result.key_terms)?;
        let risks = serde_json::to_string(&result.risks)?;

        let row = sqlx::query(
            "INSERT INTO ai_analyses
                 (id, agreement_id, summary, key_terms, risks, category, confidence_score, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
             ON CONFLICT(agreement_id) DO UPDATE SET
                 summary = excluded.summary,
                 key_terms = excluded.key_terms,
                 risks = excluded.risks,
                 category = excluded.category,
                 confidence_score = excluded.confidence_score,
                 updated_at = excluded.updated_at
             RETURNING id, agreement_id, summary, key_terms, risks, category,
                       confidence_score, created_at, updated_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(agreement_id)
        .bind(&result.summary)
        .bind(&key_terms)
        .bind(&risks)
        .bind(&result.category)
        .bind(result.confidence_score)
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .context("upsert analysis")?;

        map_analysis_row(&row)
    }

    pub async fn get_analysis(&self, agreement_id: &str) -> Result<Option<AiAnalysis>> {
        let row = sqlx::query(
            "SELECT id, agreement_id, summary, key_terms, risks, category,
                    confidence_score, created_at, updated_at
             FROM ai_analyses
             WHERE agreement_id = $1",
        )
        .bind(agreement_id)
        .fetch_optional(&self.pool)
        .await
        .context("query analysis by agreement")?;

        row.map(|r| map_analysis_row(&r)).transpose()
    }
}
