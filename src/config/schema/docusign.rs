use serde::{Deserialize, Serialize};

/// DocuSign OAuth + eSignature REST settings. Defaults target the demo
/// (developer sandbox) environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocuSignConfig {
    #[serde(default)]
    pub integration_key: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Used when the userinfo lookup after login does not name a default account.
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default = "default_oauth_base_url")]
    pub oauth_base_url: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    /// DocuSign Connect HMAC key for webhook verification.
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

fn default_oauth_base_url() -> String {
    "https://account-d.docusign.com".into()
}

fn default_api_base_url() -> String {
    "https://demo.docusign.net/restapi".into()
}

fn default_scopes() -> Vec<String> {
    vec!["signature".into()]
}

impl Default for DocuSignConfig {
    fn default() -> Self {
        Self {
            integration_key: None,
            client_secret: None,
            account_id: None,
            oauth_base_url: default_oauth_base_url(),
            api_base_url: default_api_base_url(),
            scopes: default_scopes(),
            webhook_secret: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_demo_environment() {
        let config = DocuSignConfig::default();
        assert_eq!(config.oauth_base_url, "https://account-d.docusign.com");
        assert_eq!(config.api_base_url, "https://demo.docusign.net/restapi");
        assert_eq!(config.scopes, vec!["signature".to_string()]);
        assert!(config.webhook_secret.is_none());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let decoded: DocuSignConfig = toml::from_str(r#"integration_key = "ik""#).unwrap();
        assert_eq!(decoded.integration_key.as_deref(), Some("ik"));
        assert_eq!(decoded.api_base_url, default_api_base_url());
    }
}
