use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Server-sent status channel timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusStreamConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
    /// Reconnect delay advertised to clients via the SSE `retry` field.
    #[serde(default = "default_retry_ms")]
    pub retry_ms: u64,
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_heartbeat_secs() -> u64 {
    30
}

fn default_retry_ms() -> u64 {
    5_000
}

impl Default for StatusStreamConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            heartbeat_secs: default_heartbeat_secs(),
            retry_ms: default_retry_ms(),
        }
    }
}

impl StatusStreamConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }
}
