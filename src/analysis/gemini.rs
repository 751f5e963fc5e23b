//! Google Gemini `generateContent` client for agreement analysis.

use super::gemini_types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
};
use super::parse::parse_analysis;
use super::prompt::build_analysis_prompt;
use super::{AnalysisProvider, AnalysisResult};
use crate::config::GeminiConfig;
use crate::error::AnalysisError;
use crate::util::http_client::build_outbound_client;
use crate::util::scrub::{describe_failed_response, sanitize_api_error};
use async_trait::async_trait;
use reqwest::Client;

const PROVIDER: &str = "gemini";
const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiAnalyzer {
    api_key: Option<String>,
    model: String,
    base_url: String,
    temperature: f64,
    client: Client,
}

impl GeminiAnalyzer {
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            client: build_outbound_client(config.timeout_secs),
        }
    }

    fn model_name(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/{}:generateContent",
            self.base_url,
            Self::model_name(&self.model)
        )
    }

    fn build_request(&self, content: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part::text(build_analysis_prompt(content))],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                response_mime_type: "application/json",
            },
        }
    }

    fn request_error(message: impl Into<String>) -> AnalysisError {
        AnalysisError::Request {
            provider: PROVIDER.into(),
            message: message.into(),
        }
    }

    /// Transport and decode errors without the request URL, scrubbed.
    fn transport_error(context: &str, err: reqwest::Error) -> AnalysisError {
        let err = err.without_url();
        Self::request_error(sanitize_api_error(&format!("{context}: {err}")))
    }

    fn extract_text(result: &GenerateContentResponse) -> Result<String, AnalysisError> {
        if let Some(error) = &result.error {
            return Err(Self::request_error(sanitize_api_error(&error.message)));
        }

        let text = result
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = result
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason.clone())
                .or_else(|| {
                    result
                        .candidates
                        .as_ref()
                        .and_then(|c| c.first())
                        .and_then(|c| c.finish_reason.clone())
                })
                .unwrap_or_else(|| "no candidates".into());
            return Err(Self::request_error(format!("empty response ({reason})")));
        }

        Ok(text)
    }
}

#[async_trait]
impl AnalysisProvider for GeminiAnalyzer {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn analyze(&self, content: &str) -> anyhow::Result<AnalysisResult> {
        if content.trim().is_empty() {
            return Err(AnalysisError::EmptyContent.into());
        }
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AnalysisError::NotConfigured {
                provider: PROVIDER.into(),
            })?;

        tracing::debug!(model = %self.model, chars = content.len(), "requesting gemini analysis");
        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(&self.build_request(content))
            .send()
            .await
            .map_err(|e| Self::transport_error("send", e))?;

        if !response.status().is_success() {
            let detail = describe_failed_response(response).await;
            tracing::warn!(%detail, "gemini analysis request failed");
            return Err(Self::request_error(detail).into());
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Self::transport_error("unexpected response body", e))?;
        let text = Self::extract_text(&body)?;

        let result = parse_analysis(&text).inspect_err(|e| {
            tracing::warn!(error = %e, raw = %sanitize_api_error(&text), "gemini returned unusable analysis");
        })?;
        tracing::info!(
            category = %result.category,
            risks = result.risks.len(),
            confidence = result.confidence_score,
            "agreement analyzed"
        );
        Ok(result)
    }
}
