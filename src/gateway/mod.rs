//! Axum-based HTTP gateway for the agreement API.
//!
//! - JSON API under `/api`, session cookie or bearer token auth
//! - Request body size limit (64KB max)
//! - Request timeout (30s), except the SSE status stream
//! - Optional CORS for a browser front end on another origin

mod error;
mod handlers;
mod server;
mod session;

pub use error::ApiError;
pub use server::{build_app, run_gateway, run_gateway_with_listener};
pub use session::CurrentUser;

use crate::analysis::AnalysisProvider;
use crate::config::Config;
use crate::esign::SignatureProvider;
use crate::store::SqliteStore;
use std::sync::Arc;

/// Maximum request body size (64KB) -- prevents memory exhaustion
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout (30s) -- prevents slow-loris attacks
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: SqliteStore,
    pub esign: Arc<dyn SignatureProvider>,
    pub analyzer: Arc<dyn AnalysisProvider>,
}
