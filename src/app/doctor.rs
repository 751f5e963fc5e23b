use crate::config::Config;
use crate::store::SqliteStore;
use std::fmt::Write as _;

/// One line of the doctor report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub name: &'static str,
    pub ok: bool,
    pub detail: String,
}

impl Check {
    fn new(name: &'static str, ok: bool, detail: impl Into<String>) -> Self {
        Self {
            name,
            ok,
            detail: detail.into(),
        }
    }
}

fn is_set(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

fn config_checks(config: &Config) -> Vec<Check> {
    let mut checks = Vec::new();
    checks.push(match config.validate() {
        Ok(()) => Check::new("config", true, format!("app url {}", config.app_base_url())),
        Err(error) => Check::new("config", false, error.to_string()),
    });

    let docusign = &config.docusign;
    let missing: Vec<&str> = [
        ("integration_key", docusign.integration_key.as_deref()),
        ("client_secret", docusign.client_secret.as_deref()),
    ]
    .into_iter()
    .filter(|(_, value)| !is_set(*value))
    .map(|(field, _)| field)
    .collect();
    checks.push(if missing.is_empty() {
        Check::new("docusign oauth", true, format!("redirect uri {}", config.docusign_redirect_uri()))
    } else {
        Check::new("docusign oauth", false, format!("missing {}", missing.join(", ")))
    });
    checks.push(Check::new(
        "docusign webhook",
        is_set(docusign.webhook_secret.as_deref()),
        if is_set(docusign.webhook_secret.as_deref()) {
            "HMAC secret configured"
        } else {
            "webhook_secret not set; Connect callbacks will be rejected"
        },
    ));
    checks.push(Check::new(
        "gemini",
        is_set(config.gemini.api_key.as_deref()),
        if is_set(config.gemini.api_key.as_deref()) {
            format!("model {}", config.gemini.model)
        } else {
            "api_key not set; analysis requests will fail".to_string()
        },
    ));
    checks
}

/// Probe the store and inspect configuration readiness.
pub async fn diagnose(config: &Config) -> Vec<Check> {
    let mut checks = config_checks(config);
    let database = match SqliteStore::connect(&config.database_url(), 1).await {
        Ok(store) => match store.count_users().await {
            Ok(users) => Check::new("database", true, format!("connected, {users} user(s)")),
            Err(error) => Check::new("database", false, format!("{error:#}")),
        },
        Err(error) => Check::new("database", false, format!("{error:#}")),
    };
    checks.insert(1, database);
    checks
}

pub fn render(checks: &[Check]) -> String {
    let mut out = String::from("Covenant Doctor\n");
    for check in checks {
        let mark = if check.ok { "ok  " } else { "FAIL" };
        let _ = writeln!(out, "  [{mark}] {}: {}", check.name, check.detail);
    }
    let failures = checks.iter().filter(|c| !c.ok).count();
    if failures == 0 {
        out.push_str("  All checks passed\n");
    } else {
        let _ = writeln!(out, "  {failures} check(s) need attention");
    }
    out
}
