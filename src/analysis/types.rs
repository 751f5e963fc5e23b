use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};

// Fixed severity levels the model must choose from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskSeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub severity: RiskSeverity,
}

/// Structured analysis of one agreement's text.
///
/// `key_terms` is open-ended: the prompt asks for payment, renewal,
/// termination and confidentiality terms but the model may add others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,
    pub key_terms: BTreeMap<String, String>,
    pub risks: Vec<Risk>,
    pub category: String,
    pub confidence_score: f64,
}
