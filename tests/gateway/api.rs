use super::gateway_harness::TestServer;
use reqwest::{StatusCode, header};
use serde_json::{Value, json};

#[tokio::test]
async fn api_requires_a_session() {
    let server = TestServer::start(|_| {}).await;

    for path in ["/api/agreements", "/api/analytics/metrics", "/api/organizations"] {
        let response = server.client.get(server.url(path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{path}");
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].is_string());
    }

    let forged = server
        .client
        .get(server.url("/api/agreements"))
        .bearer_auth("cov_not-a-real-token")
        .send()
        .await
        .unwrap();
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_login_and_logout() {
    let server = TestServer::start(|_| {}).await;
    server.sign_up("ann@example.com", Some("Acme")).await;

    let duplicate = server
        .client
        .post(server.url("/api/auth/register"))
        .json(&json!({"name": "Ann", "email": "ANN@example.com", "password": "x"}))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let wrong = server
        .client
        .post(server.url("/api/auth/login"))
        .json(&json!({"email": "ann@example.com", "password": "nope"}))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    let body: Value = wrong.json().await.unwrap();
    assert_eq!(body["error"], "Invalid credentials");

    let login = server
        .client
        .post(server.url("/api/auth/login"))
        .json(&json!({"email": "ann@example.com", "password": "correct horse battery"}))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);
    let cookie = login.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("covenant_session=cov_"));

    let me: Value = server
        .client
        .get(server.url("/api/auth/me"))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["user"]["email"], "ann@example.com");

    let logout = server
        .client
        .post(server.url("/api/auth/logout"))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(logout.status(), StatusCode::OK);

    let after = server
        .client
        .get(server.url("/api/auth/me"))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn agreements_are_scoped_to_the_organization() {
    let server = TestServer::start(|_| {}).await;
    let owner = server.sign_up("owner@example.com", Some("Owner Co")).await;
    let outsider = server.sign_up("outsider@example.com", Some("Other Co")).await;

    let id = server
        .create_agreement(
            &owner,
            json!({
                "title": "Master Services Agreement",
                "content": "<p>Scope of work</p>",
                "expiresAt": "2027-06-30T00:00:00Z",
            }),
        )
        .await;

    let list: Value = server
        .client
        .get(server.url("/api/agreements"))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
    assert_eq!(list["data"][0]["status"], "draft");
    assert_eq!(list["data"][0]["signatures"], json!([]));

    let foreign = server
        .client
        .get(server.url(&format!("/api/agreements/{id}")))
        .bearer_auth(&outsider)
        .send()
        .await
        .unwrap();
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);

    let outsider_list: Value = server
        .client
        .get(server.url("/api/agreements"))
        .bearer_auth(&outsider)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(outsider_list["data"], json!([]));

    let metrics: Value = server
        .client
        .get(server.url("/api/analytics/metrics"))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(metrics["agreementCount"], 1);
    assert_eq!(metrics["pendingCount"], 0);

    let events: Value = server
        .client
        .get(server.url("/api/calendar/events"))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<&str> = events
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![format!("review-{id}"), format!("deadline-{id}")]);
}

#[tokio::test]
async fn user_without_organization_gets_default_one() {
    let server = TestServer::start(|_| {}).await;
    let token = server.sign_up("solo@example.com", None).await;

    let blocked = server
        .client
        .post(server.url("/api/agreements"))
        .bearer_auth(&token)
        .json(&json!({"title": "T", "content": "C"}))
        .send()
        .await
        .unwrap();
    assert_eq!(blocked.status(), StatusCode::BAD_REQUEST);
    let body: Value = blocked.json().await.unwrap();
    assert_eq!(body["code"], "NO_ORGANIZATION");

    let created = server
        .client
        .post(server.url("/api/organizations/default"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let body: Value = created.json().await.unwrap();
    assert_eq!(body["org"]["name"], "Test User's Organization");

    server
        .create_agreement(&token, json!({"title": "T", "content": "C"}))
        .await;
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let server = TestServer::start(|_| {}).await;
    let token = server.sign_up("big@example.com", Some("Big Co")).await;

    let response = server
        .client
        .post(server.url("/api/agreements"))
        .bearer_auth(&token)
        .json(&json!({"title": "Huge", "content": "x".repeat(70_000)}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
