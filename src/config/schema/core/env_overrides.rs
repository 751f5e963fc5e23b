use super::Config;
use std::path::PathBuf;

fn env_value(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

impl Config {
    /// Environment wins over the config file. Each setting accepts the
    /// `COVENANT_*` name first, then the name the web app deployment used.
    pub fn apply_env_overrides(&mut self) {
        if let Some(url) = env_value(&["COVENANT_APP_URL", "NEXT_PUBLIC_APP_URL", "APP_URL"]) {
            self.app_url = url;
        }

        if let Some(level) = env_value(&["COVENANT_LOG_LEVEL", "RUST_LOG"]) {
            self.log_level = level;
        }

        if let Some(workspace) = env_value(&["COVENANT_WORKSPACE"]) {
            self.workspace_dir = PathBuf::from(workspace);
        }

        if let Some(port_str) = env_value(&["COVENANT_GATEWAY_PORT", "PORT"])
            && let Ok(port) = port_str.parse::<u16>()
        {
            self.gateway.port = port;
        }

        if let Some(host) = env_value(&["COVENANT_GATEWAY_HOST", "HOST"]) {
            self.gateway.host = host;
        }

        if let Some(url) = env_value(&["COVENANT_DATABASE_URL", "DATABASE_URL"]) {
            self.database.url = Some(url);
        }

        if let Some(key) = env_value(&["COVENANT_DOCUSIGN_INTEGRATION_KEY", "DOCUSIGN_INTEGRATION_KEY"]) {
            self.docusign.integration_key = Some(key);
        }

        if let Some(secret) = env_value(&["COVENANT_DOCUSIGN_CLIENT_SECRET", "DOCUSIGN_CLIENT_SECRET"]) {
            self.docusign.client_secret = Some(secret);
        }

        if let Some(account) = env_value(&["COVENANT_DOCUSIGN_ACCOUNT_ID", "DOCUSIGN_ACCOUNT_ID"]) {
            self.docusign.account_id = Some(account);
        }

        if let Some(base) = env_value(&["COVENANT_DOCUSIGN_BASE_URL", "DOCUSIGN_BASE_URL"]) {
            self.docusign.api_base_url = base;
        }

        if let Some(secret) = env_value(&["COVENANT_DOCUSIGN_WEBHOOK_SECRET", "DOCUSIGN_WEBHOOK_SECRET"]) {
            self.docusign.webhook_secret = Some(secret);
        }

        if let Some(key) = env_value(&["COVENANT_GEMINI_API_KEY", "GEMINI_API_KEY"]) {
            self.gemini.api_key = Some(key);
        }

        if let Some(model) = env_value(&["COVENANT_GEMINI_MODEL"]) {
            self.gemini.model = model;
        }
    }
}
