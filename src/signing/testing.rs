//! In-process provider double for orchestration tests.

use crate::error::EsignError;
use crate::esign::{EnvelopeStatus, SignatureProvider, SigningRequest, SigningSession};
use crate::store::{Agreement, NewAgreement, NewUser, SqliteStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct FakeProvider {
    fail: bool,
    requests: Mutex<Vec<SigningRequest>>,
    envelopes: Mutex<HashMap<String, EnvelopeStatus>>,
}

impl FakeProvider {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn requests(&self) -> Vec<SigningRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn set_envelope(&self, status: EnvelopeStatus) {
        self.envelopes
            .lock()
            .unwrap()
            .insert(status.envelope_id.clone(), status);
    }
}

#[async_trait]
impl SignatureProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    fn authorization_url(&self) -> anyhow::Result<String> {
        Ok("https://esign.invalid/oauth/auth?state=fake".into())
    }

    async fn complete_authorization(&self, _code: &str, _state: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn is_authorized(&self) -> bool {
        true
    }

    async fn create_signing_request(
        &self,
        request: &SigningRequest,
    ) -> anyhow::Result<SigningSession> {
        if self.fail {
            return Err(EsignError::Request {
                provider: "fake".into(),
                message: "boom".into(),
            }
            .into());
        }
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        let envelope_id = format!("env-{}", requests.len());
        Ok(SigningSession {
            redirect_url: format!("https://esign.invalid/sign/{envelope_id}"),
            envelope_id,
        })
    }

    async fn envelope_status(&self, envelope_id: &str) -> anyhow::Result<EnvelopeStatus> {
        self.envelopes
            .lock()
            .unwrap()
            .get(envelope_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown envelope {envelope_id}"))
    }
}

pub(crate) async fn seeded_agreement(store: &SqliteStore) -> Agreement {
    let (_, org) = store
        .create_user(NewUser {
            name: "Owner".into(),
            email: "owner@example.com".into(),
            password_hash: "h".into(),
            organization_name: Some("Owner org".into()),
        })
        .await
        .unwrap();
    store
        .create_agreement(NewAgreement {
            title: "Consulting Agreement".into(),
            content: "<p>Consultant agrees to consult.</p>".into(),
            organization_id: org.unwrap().id,
            created_by: None,
            expires_at: None,
        })
        .await
        .unwrap()
}
