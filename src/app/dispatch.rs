use crate::auth::{self, Registration};
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::gateway;
use crate::store::SqliteStore;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::info;

async fn open_store(config: &Config) -> Result<SqliteStore> {
    SqliteStore::connect(&config.database_url(), config.database.max_connections)
        .await
        .context("open agreement store")
}

/// Create a user (and optionally an organization) without going through HTTP.
pub async fn register_user(store: &SqliteStore, registration: Registration) -> Result<String> {
    let (user, organization) = auth::register(store, registration).await?;
    let mut summary = format!("Registered {} <{}> (id {})", user.name, user.email, user.id);
    if let Some(organization) = organization {
        let _ = write!(
            summary,
            "\n  Organization: {} (id {})",
            organization.name, organization.id
        );
    }
    Ok(summary)
}

pub async fn dispatch(cli: Cli, config: Arc<Config>) -> Result<()> {
    match cli.command {
        Commands::Serve { port, host } => {
            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            let port = port.unwrap_or(config.gateway.port);
            info!(%host, port, "starting covenant gateway");
            gateway::run_gateway(&host, port, config).await
        }
        Commands::Register {
            name,
            email,
            password,
            organization,
        } => {
            let store = open_store(&config).await?;
            let summary = register_user(
                &store,
                Registration {
                    name,
                    email,
                    password,
                    organization_name: organization,
                },
            )
            .await?;
            println!("{summary}");
            Ok(())
        }
        Commands::Doctor => {
            let report = crate::app::doctor::diagnose(&config).await;
            print!("{}", crate::app::doctor::render(&report));
            Ok(())
        }
    }
}
