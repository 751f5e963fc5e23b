use super::gateway_harness::TestServer;
use reqwest::StatusCode;
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gemini_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

const ANALYSIS: &str = r#"```json
{
  "summary": "Twelve month consulting engagement.",
  "keyTerms": {"term": "12 months", "fee": "$10,000"},
  "risks": [{"type": "liability", "description": "No liability cap", "severity": "high"}],
  "category": "services",
  "confidenceScore": 0.87
}
```"#;

async fn gemini_server(mock: &MockServer) -> TestServer {
    let uri = mock.uri();
    TestServer::start(move |config| {
        config.gemini.api_key = Some("gem-key".into());
        config.gemini.base_url = uri.clone();
    })
    .await
}

#[tokio::test]
async fn analysis_is_persisted_on_the_agreement() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .and(header("x-goog-api-key", "gem-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(ANALYSIS)))
        .expect(2)
        .mount(&mock)
        .await;

    let server = gemini_server(&mock).await;
    let token = server.sign_up("ai@example.com", Some("AI Co")).await;
    let id = server
        .create_agreement(&token, json!({"title": "Consulting", "content": "<p>Consult for a year.</p>"}))
        .await;

    for _ in 0..2 {
        let response = server
            .client
            .post(server.url(&format!("/api/agreements/{id}/analyze")))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["category"], "services");
        assert_eq!(body["keyTerms"]["fee"], "$10,000");
        assert_eq!(body["risks"][0]["severity"], "high");
    }

    let detail: Value = server
        .client
        .get(server.url(&format!("/api/agreements/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["aiAnalysis"]["summary"], "Twelve month consulting engagement.");
    assert_eq!(detail["aiAnalysis"]["confidenceScore"], 0.87);
}

#[tokio::test]
async fn malformed_model_output_is_a_bad_gateway() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(
            r#"{"summary": "x", "keyTerms": {}, "risks": [], "category": "c", "confidenceScore": 4.2}"#,
        )))
        .mount(&mock)
        .await;

    let server = gemini_server(&mock).await;
    let token = server.sign_up("bad@example.com", Some("Bad Co")).await;

    let response = server
        .client
        .post(server.url("/api/ai/analyze"))
        .bearer_auth(&token)
        .json(&json!({"content": "Some agreement text"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Failed to analyze agreement");
}

#[tokio::test]
async fn empty_content_never_reaches_the_api() {
    let mock = MockServer::start().await;
    let server = gemini_server(&mock).await;
    let token = server.sign_up("empty@example.com", None).await;

    let response = server
        .client
        .post(server.url("/api/ai/analyze"))
        .bearer_auth(&token)
        .json(&json!({"content": "  "}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(mock.received_requests().await.unwrap().is_empty());
}
