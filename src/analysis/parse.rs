//! Validation of model output into [`AnalysisResult`].

use super::types::{AnalysisResult, Risk, RiskSeverity};
use crate::error::AnalysisError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    summary: Option<String>,
    key_terms: Option<serde_json::Map<String, Value>>,
    risks: Option<Vec<RawRisk>>,
    category: Option<String>,
    confidence_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawRisk {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    description: String,
    severity: String,
}

/// Strip a surrounding Markdown code fence (```json ... ```), if present.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, AnalysisError> {
    value.ok_or_else(|| AnalysisError::Invalid(format!("missing field `{field}`")))
}

/// Parse and validate model text. Key-term values that are not strings are
/// rendered to text; nulls are dropped.
pub fn parse_analysis(text: &str) -> Result<AnalysisResult, AnalysisError> {
    let json = strip_code_fence(text);
    let raw: RawAnalysis =
        serde_json::from_str(json).map_err(|e| AnalysisError::Parse(e.to_string()))?;

    let summary = required(raw.summary, "summary")?;
    if summary.trim().is_empty() {
        return Err(AnalysisError::Invalid("summary is empty".into()));
    }
    let category = required(raw.category, "category")?;
    if category.trim().is_empty() {
        return Err(AnalysisError::Invalid("category is empty".into()));
    }

    let confidence_score = required(raw.confidence_score, "confidenceScore")?;
    if !(0.0..=1.0).contains(&confidence_score) {
        return Err(AnalysisError::Invalid(format!(
            "confidenceScore {confidence_score} is outside 0..=1"
        )));
    }

    let key_terms: BTreeMap<String, String> = required(raw.key_terms, "keyTerms")?
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(text) => Some((key, text)),
            other => Some((key, other.to_string())),
        })
        .collect();

    let risks = required(raw.risks, "risks")?
        .into_iter()
        .map(|risk| {
            let severity = RiskSeverity::from_str(risk.severity.trim().to_ascii_lowercase().as_str())
                .map_err(|_| {
                    AnalysisError::Invalid(format!("unknown risk severity `{}`", risk.severity))
                })?;
            Ok(Risk {
                kind: risk.kind,
                description: risk.description,
                severity,
            })
        })
        .collect::<Result<Vec<_>, AnalysisError>>()?;

    Ok(AnalysisResult {
        summary,
        key_terms,
        risks,
        category,
        confidence_score,
    })
}
