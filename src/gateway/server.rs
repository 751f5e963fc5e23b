use super::handlers::{
    agreements, auth, docusign, handle_health, insights, organizations, status_stream, webhook,
};
use super::{AppState, MAX_BODY_SIZE, REQUEST_TIMEOUT_SECS};

const SHUTDOWN_GRACE_SECS: u64 = 5;

use crate::analysis::{AnalysisProvider, GeminiAnalyzer};
use crate::config::Config;
use crate::esign::{DocuSignClient, SignatureProvider};
use crate::store::SqliteStore;
use anyhow::{Context, Result};
use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Resolve `host` (an IP, bracketed IPv6 or hostname) to a bind address.
async fn resolve_bind_addr(host: &str, port: u16) -> Result<SocketAddr> {
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    tokio::net::lookup_host((bare, port))
        .await
        .with_context(|| format!("resolve gateway bind address {host}"))?
        .next()
        .with_context(|| format!("no address found for gateway host {host}"))
}

/// Returns true when the bind address is not a loopback address.
fn is_public_bind(addr: &SocketAddr) -> bool {
    !addr.ip().is_loopback()
}

/// Run the HTTP gateway using axum with proper HTTP/1.1 compliance.
pub async fn run_gateway(host: &str, port: u16, config: Arc<Config>) -> Result<()> {
    let addr = resolve_bind_addr(host, port).await?;

    // ── Security: refuse public bind without explicit opt-in ──
    if is_public_bind(&addr) && !config.gateway.allow_public_bind {
        anyhow::bail!(
            "Refusing to bind to {host}: the API would be reachable from other machines.\n\
             Fix: use --host 127.0.0.1 (default) behind a reverse proxy, or set\n\
             [gateway] allow_public_bind = true in config.toml."
        );
    }

    let listener = TcpListener::bind(addr)
        .await
        .context("bind gateway socket")?;

    run_gateway_with_listener(host, listener, config).await
}

async fn build_gateway_state(config: Arc<Config>) -> Result<AppState> {
    let store = SqliteStore::connect(&config.database_url(), config.database.max_connections)
        .await
        .context("open agreement store")?;

    let purged = store.purge_expired_sessions(chrono::Utc::now()).await?;
    if purged > 0 {
        tracing::info!(purged, "expired sessions removed");
    }

    let esign: Arc<dyn SignatureProvider> = Arc::new(DocuSignClient::new(&config));
    let analyzer: Arc<dyn AnalysisProvider> = Arc::new(GeminiAnalyzer::new(&config.gemini));

    Ok(AppState {
        config,
        store,
        esign,
        analyzer,
    })
}

/// Run the HTTP gateway from a pre-bound listener.
pub async fn run_gateway_with_listener(
    host: &str,
    listener: TcpListener,
    config: Arc<Config>,
) -> Result<()> {
    let actual_port = listener
        .local_addr()
        .context("get gateway listener local address")?
        .port();
    let display_addr = format!("{host}:{actual_port}");

    let state = build_gateway_state(config).await?;
    print_gateway_banner(&display_addr, &state);

    let app = build_app(state);
    serve_until(
        listener,
        app,
        shutdown_signal(),
        Duration::from_secs(SHUTDOWN_GRACE_SECS),
    )
    .await
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "cannot listen for ctrl-c; graceful shutdown disabled");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

/// Serve until `shutdown` resolves, then give in-flight requests `grace` to
/// finish. Status streams never finish on their own, so they are cut off
/// when the grace period ends.
async fn serve_until<F>(listener: TcpListener, app: Router, shutdown: F, grace: Duration) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let requested = Arc::new(Notify::new());
    let notify = Arc::clone(&requested);
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown.await;
        notify.notify_one();
    });

    tokio::select! {
        result = server.into_future() => result.context("serve HTTP gateway")?,
        () = async {
            requested.notified().await;
            tokio::time::sleep(grace).await;
        } => tracing::warn!("open connections did not drain in time; stopping"),
    }

    Ok(())
}

fn print_gateway_banner(display_addr: &str, state: &AppState) {
    println!("Covenant listening on {display_addr}");
    println!("  GET  /health");
    println!("  /api/auth, /api/agreements, /api/organizations");
    println!("  /api/analytics/metrics, /api/calendar/events");
    println!("  POST /api/docusign/webhook");
    if state.config.docusign.webhook_secret.is_none() {
        println!("  DocuSign webhook secret not set: webhook calls will be rejected");
    }
    if !state.analyzer.is_configured() {
        println!("  Gemini API key not set: analysis is disabled");
    }
}

/// Assemble the router. The status stream is mounted after the timeout
/// layer so long-lived connections are not cut off.
pub fn build_app(state: AppState) -> Router {
    let cors_origins = state.config.gateway.cors_origins.clone();

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/api/auth/register", post(auth::handle_register))
        .route("/api/auth/login", post(auth::handle_login))
        .route("/api/auth/logout", post(auth::handle_logout))
        .route("/api/auth/me", get(auth::handle_me))
        .route(
            "/api/agreements",
            get(agreements::handle_list).post(agreements::handle_create),
        )
        .route("/api/agreements/{id}", get(agreements::handle_detail))
        .route("/api/agreements/{id}/sign", post(agreements::handle_sign))
        .route("/api/agreements/{id}/sync", post(agreements::handle_sync))
        .route(
            "/api/agreements/{id}/analyze",
            post(agreements::handle_analyze),
        )
        .route("/api/ai/analyze", post(insights::handle_adhoc_analyze))
        .route(
            "/api/organizations",
            get(organizations::handle_get).post(organizations::handle_create),
        )
        .route(
            "/api/organizations/default",
            post(organizations::handle_default),
        )
        .route("/api/analytics/metrics", get(insights::handle_metrics))
        .route("/api/calendar/events", get(insights::handle_calendar))
        .route("/api/docusign/authorize", get(docusign::handle_authorize))
        .route("/api/docusign/callback", get(docusign::handle_callback))
        .route("/api/docusign/webhook", post(webhook::handle_webhook))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
        .route(
            "/api/agreements/{id}/status",
            get(status_stream::handle_status_stream),
        );

    let mut app = app.with_state(state);

    if !cors_origins.is_empty() {
        let origins: Vec<_> = cors_origins.iter().filter_map(|o| o.parse().ok()).collect();
        app = app.layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_credentials(true)
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                .allow_headers([
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::AUTHORIZATION,
                ]),
        );
    }

    app
}
