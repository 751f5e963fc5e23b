use super::gateway_harness::TestServer;
use covenant::esign::webhook::{SIGNATURE_HEADER, compute_signature};
use reqwest::{StatusCode, header};
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, header as header_eq, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WEBHOOK_SECRET: &str = "connect-hmac-key";

async fn docusign_server(mock: &MockServer) -> TestServer {
    let uri = mock.uri();
    TestServer::start(move |config| {
        config.docusign.integration_key = Some("integration-key".into());
        config.docusign.client_secret = Some("client-secret".into());
        config.docusign.oauth_base_url = uri.clone();
        config.docusign.api_base_url = format!("{uri}/restapi");
        config.docusign.webhook_secret = Some(WEBHOOK_SECRET.into());
    })
    .await
}

async fn mount_oauth(mock: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code"))
        .and(body_string_contains("code_verifier="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "token_type": "Bearer",
            "refresh_token": "refresh-1",
            "expires_in": 28_800,
        })))
        .expect(1)
        .mount(mock)
        .await;

    Mock::given(method("GET"))
        .and(path("/oauth/userinfo"))
        .and(header_eq("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accounts": [
                {"account_id": "acct-secondary", "is_default": false},
                {"account_id": "acct-main", "is_default": true},
            ]
        })))
        .mount(mock)
        .await;
}

async fn mount_envelope(mock: &MockServer, envelope_id: &str) {
    Mock::given(method("POST"))
        .and(path("/restapi/v2.1/accounts/acct-main/envelopes"))
        .and(header_eq("authorization", "Bearer access-1"))
        .and(body_string_contains("Please sign: Consulting Agreement"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "envelopeId": envelope_id,
            "status": "sent",
        })))
        .expect(1)
        .mount(mock)
        .await;

    Mock::given(method("POST"))
        .and(path(format!(
            "/restapi/v2.1/accounts/acct-main/envelopes/{envelope_id}/views/recipient"
        )))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "url": format!("https://demo.docusign.net/signing/{envelope_id}"),
        })))
        .mount(mock)
        .await;
}

async fn esign_authorized(server: &TestServer) -> bool {
    let health: Value = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    health["esignAuthorized"].as_bool().unwrap()
}

async fn authorize(server: &TestServer, token: &str) {
    let authorize: Value = server
        .client
        .get(server.url("/api/docusign/authorize"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let url = url::Url::parse(authorize["url"].as_str().unwrap()).unwrap();
    let state = url
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .unwrap();

    let callback = server
        .client
        .get(server.url("/api/docusign/callback"))
        .query(&[("code", "auth-code"), ("state", state.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(callback.status(), StatusCode::SEE_OTHER);
    assert!(
        callback.headers()[header::LOCATION]
            .to_str()
            .unwrap()
            .ends_with("/agreements?docusign=connected")
    );

    let replay = server
        .client
        .get(server.url("/api/docusign/callback"))
        .query(&[("code", "auth-code"), ("state", state.as_str())])
        .send()
        .await
        .unwrap();
    assert!(
        replay.headers()[header::LOCATION]
            .to_str()
            .unwrap()
            .contains("/error?message=")
    );
}

async fn post_webhook(server: &TestServer, body: &str, signature: Option<String>) -> reqwest::Response {
    let mut request = server
        .client
        .post(server.url("/api/docusign/webhook"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.to_string());
    if let Some(signature) = signature {
        request = request.header(SIGNATURE_HEADER, signature);
    }
    request.send().await.unwrap()
}

async fn agreement_status(server: &TestServer, token: &str, id: &str) -> Value {
    server
        .client
        .get(server.url(&format!("/api/agreements/{id}")))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn oauth_sign_and_webhook_complete_an_agreement() {
    let mock = MockServer::start().await;
    mount_oauth(&mock).await;
    mount_envelope(&mock, "env-42").await;

    let server = docusign_server(&mock).await;
    let token = server.sign_up("owner@example.com", Some("Owner Co")).await;
    let id = server
        .create_agreement(
            &token,
            json!({"title": "Consulting Agreement", "content": "<p>Consult.</p>"}),
        )
        .await;

    assert!(!esign_authorized(&server).await);
    authorize(&server, &token).await;
    assert!(esign_authorized(&server).await);

    let sign: Value = server
        .client
        .post(server.url(&format!("/api/agreements/{id}/sign")))
        .bearer_auth(&token)
        .json(&json!({"signerEmail": "signer@example.com", "signerName": "Sam Signer"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(sign["redirectUrl"], "https://demo.docusign.net/signing/env-42");
    assert_eq!(sign["signature"]["docuSignEnvelopeId"], "env-42");
    assert_eq!(agreement_status(&server, &token, &id).await["status"], "pending");

    let delivered = json!({
        "event": "recipient-delivered",
        "data": {"envelopeId": "env-42", "envelopeSummary": {"status": "sent",
            "recipients": {"signers": [{"email": "signer@example.com", "status": "delivered"}]}}}
    })
    .to_string();
    let response = post_webhook(
        &server,
        &delivered,
        compute_signature(WEBHOOK_SECRET, delivered.as_bytes()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(agreement_status(&server, &token, &id).await["status"], "pending");

    let completed = json!({
        "event": "envelope-completed",
        "data": {"envelopeId": "env-42", "envelopeSummary": {"status": "completed",
            "recipients": {"signers": [{"email": "signer@example.com", "status": "completed",
                "signedDateTime": "2026-05-01T10:00:00Z"}]}}}
    })
    .to_string();
    let response = post_webhook(
        &server,
        &completed,
        compute_signature(WEBHOOK_SECRET, completed.as_bytes()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let ack: Value = response.json().await.unwrap();
    assert_eq!(ack["success"], true);

    let detail = agreement_status(&server, &token, &id).await;
    assert_eq!(detail["status"], "signed");
    assert_eq!(detail["signatures"][0]["status"], "completed");
    assert_eq!(detail["signatures"][0]["signedAt"], "2026-05-01T10:00:00Z");

    let metrics: Value = server
        .client
        .get(server.url("/api/analytics/metrics"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(metrics["signedCount"], 1);
}

#[tokio::test]
async fn sync_polls_envelope_status() {
    let mock = MockServer::start().await;
    mount_oauth(&mock).await;
    mount_envelope(&mock, "env-7").await;
    Mock::given(method("GET"))
        .and(path("/restapi/v2.1/accounts/acct-main/envelopes/env-7"))
        .and(query_param("include", "recipients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "envelopeId": "env-7",
            "status": "declined",
            "recipients": {"signers": [{"email": "signer@example.com", "status": "declined",
                "declinedDateTime": "2026-05-02T08:30:00Z"}]}
        })))
        .mount(&mock)
        .await;

    let server = docusign_server(&mock).await;
    let token = server.sign_up("sync@example.com", Some("Sync Co")).await;
    let id = server
        .create_agreement(
            &token,
            json!({"title": "Consulting Agreement", "content": "<p>Consult.</p>"}),
        )
        .await;
    authorize(&server, &token).await;
    server
        .client
        .post(server.url(&format!("/api/agreements/{id}/sign")))
        .bearer_auth(&token)
        .json(&json!({"signerEmail": "signer@example.com", "signerName": "Sam Signer"}))
        .send()
        .await
        .unwrap();

    let synced: Value = server
        .client
        .post(server.url(&format!("/api/agreements/{id}/sync")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(synced["updated"], 1);
    assert_eq!(synced["agreement"]["status"], "pending");
    assert_eq!(synced["agreement"]["signatures"][0]["status"], "declined");
}

#[tokio::test]
async fn signing_before_authorization_is_refused() {
    let mock = MockServer::start().await;
    let server = docusign_server(&mock).await;
    let token = server.sign_up("early@example.com", Some("Early Co")).await;
    let id = server
        .create_agreement(&token, json!({"title": "T", "content": "C"}))
        .await;

    let response = server
        .client
        .post(server.url(&format!("/api/agreements/{id}/sign")))
        .bearer_auth(&token)
        .json(&json!({"signerEmail": "s@example.com", "signerName": "S"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("not authorized"));
    assert_eq!(agreement_status(&server, &token, &id).await["status"], "draft");
}

#[tokio::test]
async fn forged_callback_state_redirects_to_error_page() {
    let mock = MockServer::start().await;
    let server = docusign_server(&mock).await;

    let response = server
        .client
        .get(server.url("/api/docusign/callback"))
        .query(&[("code", "auth-code"), ("state", "forged")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.contains("/error?message=Failed+to+connect+DocuSign"));
    assert!(mock.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn webhook_authentication_failures() {
    let mock = MockServer::start().await;
    let server = docusign_server(&mock).await;
    let body = r#"{"data":{"envelopeId":"env-1","envelopeSummary":{"status":"completed"}}}"#;

    let missing = post_webhook(&server, body, None).await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong_secret = post_webhook(&server, body, compute_signature("other-key", body.as_bytes())).await;
    assert_eq!(wrong_secret.status(), StatusCode::UNAUTHORIZED);

    let tampered = post_webhook(
        &server,
        &body.replace("completed", "declined"),
        compute_signature(WEBHOOK_SECRET, body.as_bytes()),
    )
    .await;
    assert_eq!(tampered.status(), StatusCode::UNAUTHORIZED);

    let malformed = "{not json";
    let bad_json = post_webhook(
        &server,
        malformed,
        compute_signature(WEBHOOK_SECRET, malformed.as_bytes()),
    )
    .await;
    assert_eq!(bad_json.status(), StatusCode::BAD_REQUEST);

    let unknown = post_webhook(&server, body, compute_signature(WEBHOOK_SECRET, body.as_bytes())).await;
    assert_eq!(unknown.status(), StatusCode::OK);
}
