//! AI analysis of agreement text.

pub mod gemini;
mod gemini_types;
pub mod parse;
pub mod prompt;
mod types;

pub use gemini::GeminiAnalyzer;
pub use types::{AnalysisResult, Risk, RiskSeverity};

use async_trait::async_trait;

/// Generative-AI backend that turns agreement text into an [`AnalysisResult`].
///
/// Implementations reject blank content with
/// [`crate::error::AnalysisError::EmptyContent`] before any network call.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    fn name(&self) -> &str;

    fn is_configured(&self) -> bool;

    async fn analyze(&self, content: &str) -> anyhow::Result<AnalysisResult>;
}
