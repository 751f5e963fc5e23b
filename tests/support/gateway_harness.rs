#![allow(dead_code)]

use covenant::config::Config;
use covenant::gateway::run_gateway_with_listener;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub struct TestServer {
    pub port: u16,
    pub client: reqwest::Client,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
    _workspace: TempDir,
}

impl TestServer {
    /// Start a gateway on an ephemeral port backed by a fresh SQLite file.
    pub async fn start(configure: impl FnOnce(&mut Config)) -> Self {
        let workspace = TempDir::new().expect("temp workspace should be created");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("ephemeral gateway listener should bind");
        let port = listener
            .local_addr()
            .expect("ephemeral gateway listener should expose local address")
            .port();

        let mut config = Config::default();
        config.workspace_dir = workspace.path().to_path_buf();
        config.config_path = workspace.path().join("config.toml");
        config.app_url = format!("http://127.0.0.1:{port}");
        configure(&mut config);

        let host = "127.0.0.1".to_string();
        let handle = tokio::spawn(async move {
            run_gateway_with_listener(&host, listener, Arc::new(config)).await
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client should be built");

        let server = Self {
            port,
            client,
            handle,
            _workspace: workspace,
        };
        server.wait_until_ready().await;
        server
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{path}", self.port)
    }

    async fn wait_until_ready(&self) {
        for _ in 0..100 {
            let health = self.client.get(self.url("/health")).send().await;
            if matches!(health, Ok(resp) if resp.status() == StatusCode::OK) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("gateway did not become ready on port {}", self.port);
    }

    /// Register a user and log in; returns the session token.
    pub async fn sign_up(&self, email: &str, organization: Option<&str>) -> String {
        let register = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "name": "Test User",
                "email": email,
                "password": "correct horse battery",
                "organizationName": organization,
            }))
            .send()
            .await
            .expect("register request should complete");
        assert_eq!(register.status(), StatusCode::CREATED);

        let login: Value = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": "correct horse battery" }))
            .send()
            .await
            .expect("login request should complete")
            .json()
            .await
            .expect("login response should be JSON");
        login["token"]
            .as_str()
            .expect("login should return a token")
            .to_string()
    }

    /// Create an agreement as `token`; returns its id.
    pub async fn create_agreement(&self, token: &str, body: Value) -> String {
        let response = self
            .client
            .post(self.url("/api/agreements"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("create request should complete");
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: Value = response.json().await.expect("create response should be JSON");
        created["data"]["id"]
            .as_str()
            .expect("created agreement should have an id")
            .to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
