//! DocuSign OAuth (authorization code + PKCE) and eSignature REST client.

use super::pkce::{CHALLENGE_METHOD, generate_pkce, generate_state};
use super::types::{
    Document, EnvelopeDefinition, EnvelopeSummary, RecipientView, RecipientViewRequest,
    Recipients, SignHereTab, Signer, Tabs, TokenResponse, UserInfo, WireEnvelope,
};
use super::{
    EnvelopeStatus, PendingAuthorizations, SignatureProvider, SigningRequest, SigningSession,
};
use crate::config::{Config, DocuSignConfig};
use crate::error::EsignError;
use crate::util::http_client::build_outbound_client;
use crate::util::scrub::describe_failed_response;
use anyhow::Result;
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

const PROVIDER: &str = "docusign";
const REQUEST_TIMEOUT_SECS: u64 = 30;
/// Tokens this close to expiry are refreshed before use.
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct AccessToken {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: DateTime<Utc>,
    account_id: String,
}

impl AccessToken {
    fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECS) >= self.expires_at
    }
}

pub struct DocuSignClient {
    config: DocuSignConfig,
    redirect_uri: String,
    app_url: String,
    client: Client,
    pending: PendingAuthorizations,
    token: RwLock<Option<AccessToken>>,
}

fn request_error(message: impl Into<String>) -> anyhow::Error {
    EsignError::Request {
        provider: PROVIDER.into(),
        message: message.into(),
    }
    .into()
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response, what: &str) -> Result<T> {
    if !response.status().is_success() {
        let detail = describe_failed_response(response).await;
        tracing::warn!(operation = what, %detail, "docusign request failed");
        return Err(request_error(format!("{what} failed: {detail}")));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| request_error(format!("{what} returned an unexpected body: {e}")))
}

impl DocuSignClient {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.docusign.clone(),
            redirect_uri: config.docusign_redirect_uri(),
            app_url: config.app_base_url().to_string(),
            client: build_outbound_client(REQUEST_TIMEOUT_SECS),
            pending: PendingAuthorizations::new(),
            token: RwLock::new(None),
        }
    }

    fn required<'a>(&self, value: Option<&'a str>, field: &'static str) -> Result<&'a str> {
        value.filter(|v| !v.is_empty()).ok_or_else(|| {
            EsignError::NotConfigured {
                provider: PROVIDER.into(),
                field,
            }
            .into()
        })
    }

    fn oauth_url(&self, path: &str) -> String {
        format!("{}{path}", self.config.oauth_base_url.trim_end_matches('/'))
    }

    fn accounts_url(&self, account_id: &str, path: &str) -> String {
        format!(
            "{}/v2.1/accounts/{account_id}{path}",
            self.config.api_base_url.trim_end_matches('/')
        )
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let client_id = self.required(self.config.integration_key.as_deref(), "integration_key")?;
        let client_secret = self.required(self.config.client_secret.as_deref(), "client_secret")?;

        let response = self
            .client
            .post(self.oauth_url("/oauth/token"))
            .basic_auth(client_id, Some(client_secret))
            .header("Accept", "application/json")
            .form(form)
            .send()
            .await
            .map_err(|e| request_error(format!("token request failed: {e}")))?;

        read_json(response, "token request").await
    }

    async fn resolve_account_id(&self, access_token: &str) -> Result<String> {
        let response = self
            .client
            .get(self.oauth_url("/oauth/userinfo"))
            .bearer_auth(access_token)
            .send()
            .await;

        let from_userinfo = match response {
            Ok(response) => match read_json::<UserInfo>(response, "userinfo").await {
                Ok(info) => info.preferred_account_id().map(str::to_string),
                Err(e) => {
                    tracing::warn!(error = %e, "userinfo lookup failed; using configured account");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "userinfo request failed; using configured account");
                None
            }
        };

        match from_userinfo {
            Some(account_id) => Ok(account_id),
            None => self
                .required(self.config.account_id.as_deref(), "account_id")
                .map(str::to_string),
        }
    }

    async fn refresh(&self, current: &AccessToken) -> Result<AccessToken> {
        let Some(refresh_token) = current.refresh_token.as_deref() else {
            return Err(EsignError::TokenExpired {
                provider: PROVIDER.into(),
            }
            .into());
        };

        let token = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await?;

        tracing::info!("docusign access token refreshed");
        Ok(AccessToken {
            access_token: token.access_token,
            refresh_token: token.refresh_token.or_else(|| current.refresh_token.clone()),
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
            account_id: current.account_id.clone(),
        })
    }

    /// A usable token, refreshed first when close to expiry.
    async fn current_token(&self) -> Result<AccessToken> {
        let current = self.token.read().await.clone();
        let Some(current) = current else {
            return Err(EsignError::NotAuthorized {
                provider: PROVIDER.into(),
            }
            .into());
        };

        if !current.needs_refresh(Utc::now()) {
            return Ok(current);
        }

        let mut slot = self.token.write().await;
        if let Some(existing) = slot.as_ref()
            && !existing.needs_refresh(Utc::now())
        {
            return Ok(existing.clone());
        }
        match self.refresh(&current).await {
            Ok(refreshed) => {
                *slot = Some(refreshed.clone());
                Ok(refreshed)
            }
            Err(e) => {
                *slot = None;
                Err(e)
            }
        }
    }

    fn envelope_definition(&self, request: &SigningRequest) -> EnvelopeDefinition {
        EnvelopeDefinition {
            email_subject: format!("Please sign: {}", request.document_name),
            documents: vec![Document {
                document_base64: STANDARD.encode(request.document_content.as_bytes()),
                name: request.document_name.clone(),
                file_extension: "html".into(),
                document_id: "1".into(),
            }],
            recipients: Recipients {
                signers: vec![Signer {
                    email: request.signer_email.clone(),
                    name: request.signer_name.clone(),
                    recipient_id: "1".into(),
                    routing_order: "1".into(),
                    client_user_id: request.agreement_id.clone(),
                    tabs: Tabs {
                        sign_here_tabs: vec![SignHereTab {
                            document_id: "1".into(),
                            page_number: "1".into(),
                            x_position: "200".into(),
                            y_position: "200".into(),
                        }],
                    },
                }],
            },
            status: "sent".into(),
        }
    }

    fn return_url(&self, agreement_id: &str) -> String {
        format!("{}/agreements/{agreement_id}/signed", self.app_url)
    }
}

#[async_trait]
impl SignatureProvider for DocuSignClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn authorization_url(&self) -> Result<String> {
        let client_id = self.required(self.config.integration_key.as_deref(), "integration_key")?;
        let pkce = generate_pkce();
        let state = generate_state();
        let scope = self.config.scopes.join(" ");

        let url = url::Url::parse_with_params(
            &self.oauth_url("/oauth/auth"),
            [
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("client_id", client_id),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("code_challenge", pkce.challenge.as_str()),
                ("code_challenge_method", CHALLENGE_METHOD),
                ("state", state.as_str()),
                ("prompt", "login"),
            ],
        )?;

        self.pending.insert(state, pkce.verifier);
        Ok(url.into())
    }

    async fn complete_authorization(&self, code: &str, state: &str) -> Result<()> {
        let verifier = self.pending.take(state).ok_or(EsignError::UnknownState)?;

        let token = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("code_verifier", verifier.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .await?;
        let account_id = self.resolve_account_id(&token.access_token).await?;

        tracing::info!(%account_id, expires_in = token.expires_in, "docusign authorized");
        *self.token.write().await = Some(AccessToken {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
            account_id,
        });
        Ok(())
    }

    async fn is_authorized(&self) -> bool {
        self.token.read().await.is_some()
    }

    async fn create_signing_request(&self, request: &SigningRequest) -> Result<SigningSession> {
        let token = self.current_token().await?;

        let response = self
            .client
            .post(self.accounts_url(&token.account_id, "/envelopes"))
            .bearer_auth(&token.access_token)
            .json(&self.envelope_definition(request))
            .send()
            .await
            .map_err(|e| request_error(format!("envelope creation failed: {e}")))?;
        let envelope: EnvelopeSummary = read_json(response, "envelope creation").await?;

        tracing::info!(
            envelope_id = %envelope.envelope_id,
            agreement_id = %request.agreement_id,
            status = envelope.status.as_deref().unwrap_or("unknown"),
            "docusign envelope created"
        );

        let view_request = RecipientViewRequest {
            authentication_method: "none".into(),
            client_user_id: request.agreement_id.clone(),
            recipient_id: "1".into(),
            return_url: self.return_url(&request.agreement_id),
            user_name: request.signer_name.clone(),
            email: request.signer_email.clone(),
        };
        let response = self
            .client
            .post(self.accounts_url(
                &token.account_id,
                &format!("/envelopes/{}/views/recipient", envelope.envelope_id),
            ))
            .bearer_auth(&token.access_token)
            .json(&view_request)
            .send()
            .await
            .map_err(|e| request_error(format!("recipient view failed: {e}")))?;
        let view: RecipientView = read_json(response, "recipient view").await?;

        Ok(SigningSession {
            envelope_id: envelope.envelope_id,
            redirect_url: view.url,
        })
    }

    async fn envelope_status(&self, envelope_id: &str) -> Result<EnvelopeStatus> {
        let token = self.current_token().await?;

        let response = self
            .client
            .get(self.accounts_url(&token.account_id, &format!("/envelopes/{envelope_id}")))
            .query(&[("include", "recipients")])
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| request_error(format!("envelope lookup failed: {e}")))?;
        let envelope: WireEnvelope = read_json(response, "envelope lookup").await?;

        envelope
            .into_status(Some(envelope_id.to_string()))
            .ok_or_else(|| request_error("envelope lookup returned no envelope id"))
    }
}
