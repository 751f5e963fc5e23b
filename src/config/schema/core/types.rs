use super::super::{
    DatabaseConfig, DocuSignConfig, GatewayConfig, GeminiConfig, SessionConfig,
    StatusStreamConfig,
};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Workspace directory - computed from home, not serialized
    #[serde(skip)]
    pub workspace_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Public base URL of the web app; OAuth and signing return URLs hang off it.
    #[serde(default = "default_app_url")]
    pub app_url: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub docusign: DocuSignConfig,

    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub status_stream: StatusStreamConfig,
}

fn default_app_url() -> String {
    "http://localhost:3000".into()
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace_dir: PathBuf::new(),
            config_path: PathBuf::new(),
            app_url: default_app_url(),
            log_level: default_log_level(),
            gateway: GatewayConfig::default(),
            database: DatabaseConfig::default(),
            docusign: DocuSignConfig::default(),
            gemini: GeminiConfig::default(),
            session: SessionConfig::default(),
            status_stream: StatusStreamConfig::default(),
        }
    }
}

impl Config {
    /// App URL without a trailing slash.
    pub fn app_base_url(&self) -> &str {
        self.app_url.trim_end_matches('/')
    }

    /// OAuth redirect target registered with the e-signature provider.
    pub fn docusign_redirect_uri(&self) -> String {
        format!("{}/api/docusign/callback", self.app_base_url())
    }

    /// Database URL, defaulting to a SQLite file inside the workspace.
    pub fn database_url(&self) -> String {
        self.database.url.clone().unwrap_or_else(|| {
            format!(
                "sqlite://{}?mode=rwc",
                self.workspace_dir.join("covenant.db").display()
            )
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.app_url).map_err(|e| {
            ConfigError::Validation(format!("app_url '{}' is not a valid URL: {e}", self.app_url))
        })?;
        let checks = [
            (
                self.status_stream.poll_interval_secs > 0,
                "status_stream.poll_interval_secs must be greater than zero",
            ),
            (
                self.status_stream.heartbeat_secs > 0,
                "status_stream.heartbeat_secs must be greater than zero",
            ),
            (
                self.session.ttl_days > 0,
                "session.ttl_days must be greater than zero",
            ),
            (
                (0.0..=2.0).contains(&self.gemini.temperature),
                "gemini.temperature must be within 0.0..=2.0",
            ),
        ];
        match checks.into_iter().find(|(ok, _)| !ok) {
            Some((_, message)) => Err(ConfigError::Validation(message.into())),
            None => Ok(()),
        }
    }
}
