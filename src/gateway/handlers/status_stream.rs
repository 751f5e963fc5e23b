//! Server-sent status updates for one agreement.
//!
//! The stream polls the store, emits a `data:` frame whenever the snapshot
//! changes, and sends heartbeat comments so idle proxies keep the
//! connection open. The first frame advertises the reconnect delay.

use super::super::{ApiError, AppState, CurrentUser};
use super::owned_agreement;
use crate::store::{AgreementStatus, SignatureSummary, SqliteStore};
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Response, StatusCode, header};
use serde::Serialize;
use std::convert::Infallible;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatusSnapshot {
    pub agreement_id: String,
    pub status: AgreementStatus,
    pub signatures: Vec<SignatureSummary>,
}

enum Tick {
    Poll,
    Heartbeat,
}

pub(crate) async fn load_snapshot(
    store: &SqliteStore,
    agreement_id: &str,
) -> anyhow::Result<Option<StatusSnapshot>> {
    Ok(store
        .agreement_status_snapshot(agreement_id)
        .await?
        .map(|(status, signatures)| StatusSnapshot {
            agreement_id: agreement_id.to_string(),
            status,
            signatures: signatures.iter().map(SignatureSummary::from).collect(),
        }))
}

fn data_frame(json: &str) -> String {
    format!("data: {json}\n\n")
}

/// GET /api/agreements/{id}/status
pub(crate) async fn handle_status_stream(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let agreement = owned_agreement(&state, &user, &id).await?;
    let store = state.store.clone();
    let agreement_id = agreement.id;
    let settings = state.config.status_stream.clone();
    let poll_every = settings.poll_interval();
    let heartbeat_every = settings.heartbeat_interval();

    tracing::debug!(%agreement_id, "status stream opened");

    let stream = async_stream::stream! {
        yield Ok::<_, Infallible>(format!("retry: {}\n\n", settings.retry_ms));

        let mut poll = tokio::time::interval(poll_every);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut heartbeat = tokio::time::interval_at(Instant::now() + heartbeat_every, heartbeat_every);
        let mut last: Option<String> = None;

        loop {
            let tick = tokio::select! {
                _ = poll.tick() => Tick::Poll,
                _ = heartbeat.tick() => Tick::Heartbeat,
            };

            match tick {
                Tick::Heartbeat => yield Ok(": heartbeat\n\n".to_string()),
                Tick::Poll => match load_snapshot(&store, &agreement_id).await {
                    Ok(Some(snapshot)) => match serde_json::to_string(&snapshot) {
                        Ok(json) if last.as_deref() != Some(json.as_str()) => {
                            yield Ok(data_frame(&json));
                            last = Some(json);
                        }
                        Ok(_) => {}
                        Err(error) => tracing::warn!(%agreement_id, %error, "status snapshot not serializable"),
                    },
                    Ok(None) => {
                        yield Ok(format!("event: error\n{}", data_frame(r#"{"error":"Agreement not found"}"#)));
                        break;
                    }
                    Err(error) => {
                        tracing::warn!(%agreement_id, error = %format!("{error:#}"), "status poll failed");
                    }
                },
            }
        }
    };

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = StatusCode::OK;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/event-stream"),
    );
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-cache"),
    );
    response.headers_mut().insert(
        header::CONNECTION,
        header::HeaderValue::from_static("keep-alive"),
    );
    Ok(response)
}

