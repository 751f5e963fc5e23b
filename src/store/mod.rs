//! SQLite persistence for organizations, users, sessions, agreements,
//! signatures and analyses.
//!
//! The schema is created idempotently on open and pinned with a version row
//! in `covenant_schema_meta`; there is no migration path between versions.

mod agreements;
mod analyses;
mod organizations;
mod sessions;
mod signatures;
pub mod types;
mod users;

pub use types::{
    AgreementDetail, AgreementListItem, AgreementStatus, Agreement, AiAnalysis, NewAgreement,
    NewUser, Organization, Session, Signature, SignatureStatus, SignatureSummary, StatusCounts,
    User, UserCredentials,
};

use crate::error::StoreError;
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

const SCHEMA_META_TABLE: &str = "
CREATE TABLE IF NOT EXISTS covenant_schema_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
)";
const SCHEMA_VERSION_KEY: &str = "covenant_schema_version";
const SCHEMA_VERSION: u32 = 1;

const SCHEMA_TABLES: [&str; 9] = [
    "CREATE TABLE IF NOT EXISTS organizations (
         id TEXT PRIMARY KEY,
         name TEXT NOT NULL,
         created_at TEXT NOT NULL
     )",
    "CREATE TABLE IF NOT EXISTS users (
         id TEXT PRIMARY KEY,
         name TEXT NOT NULL,
         email TEXT NOT NULL UNIQUE,
         password_hash TEXT NOT NULL,
         organization_id TEXT REFERENCES organizations(id) ON DELETE SET NULL,
         created_at TEXT NOT NULL
     )",
    "CREATE TABLE IF NOT EXISTS sessions (
         token_hash TEXT PRIMARY KEY,
         user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
         created_at TEXT NOT NULL,
         expires_at TEXT NOT NULL
     )",
    "CREATE TABLE IF NOT EXISTS agreements (
         id TEXT PRIMARY KEY,
         title TEXT NOT NULL,
         content TEXT NOT NULL,
         status TEXT NOT NULL DEFAULT 'draft',
         organization_id TEXT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
         created_by TEXT REFERENCES users(id) ON DELETE SET NULL,
         expires_at TEXT,
         created_at TEXT NOT NULL,
         updated_at TEXT NOT NULL
     )",
    "CREATE INDEX IF NOT EXISTS idx_agreements_org_created
         ON agreements(organization_id, created_at)",
    "CREATE TABLE IF NOT EXISTS signatures (
         id TEXT PRIMARY KEY,
         agreement_id TEXT NOT NULL REFERENCES agreements(id) ON DELETE CASCADE,
         signer_email TEXT NOT NULL,
         signer_name TEXT NOT NULL,
         status TEXT NOT NULL DEFAULT 'pending',
         signed_at TEXT,
         envelope_id TEXT,
         created_at TEXT NOT NULL,
         updated_at TEXT NOT NULL,
         UNIQUE(agreement_id, signer_email)
     )",
    "CREATE INDEX IF NOT EXISTS idx_signatures_envelope
         ON signatures(envelope_id)",
    "CREATE TABLE IF NOT EXISTS ai_analyses (
         id TEXT PRIMARY KEY,
         agreement_id TEXT NOT NULL UNIQUE REFERENCES agreements(id) ON DELETE CASCADE,
         summary TEXT NOT NULL,
         key_terms TEXT NOT NULL,
         risks TEXT NOT NULL,
         category TEXT NOT NULL,
         confidence_score REAL NOT NULL,
         created_at TEXT NOT NULL,
         updated_at TEXT NOT NULL
     )",
    "CREATE INDEX IF NOT EXISTS idx_sessions_user
         ON sessions(user_id)",
];

async fn ensure_schema_version(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SCHEMA_META_TABLE)
        .execute(pool)
        .await
        .context("create covenant_schema_meta table")?;

    let stored_version: Option<(String,)> =
        sqlx::query_as("SELECT value FROM covenant_schema_meta WHERE key = $1")
            .bind(SCHEMA_VERSION_KEY)
            .fetch_optional(pool)
            .await
            .context("load schema version")?;

    if let Some((value,)) = stored_version {
        let parsed = value
            .parse::<u32>()
            .map_err(|_| StoreError::Schema(format!("invalid schema version value: {value}")))?;
        if parsed != SCHEMA_VERSION {
            return Err(StoreError::Schema(format!(
                "incompatible database schema version: stored={parsed}, expected={SCHEMA_VERSION}. \
remove the database file and restart."
            ))
            .into());
        }
        return Ok(());
    }

    sqlx::query("INSERT INTO covenant_schema_meta (key, value) VALUES ($1, $2)")
        .bind(SCHEMA_VERSION_KEY)
        .bind(SCHEMA_VERSION.to_string())
        .execute(pool)
        .await
        .context("persist schema version")?;

    Ok(())
}

/// SQLite-backed store using a sqlx async pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `url`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url: {url}"))?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .context("open database")?;
        Self::new(pool).await
    }

    /// Wrap an existing pool and bootstrap the schema.
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        sqlx::query("PRAGMA foreign_keys = ON;")
            .execute(&pool)
            .await?;

        ensure_schema_version(&pool).await?;

        for statement in SCHEMA_TABLES {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .context("bootstrap schema")?;
        }

        Ok(Self { pool })
    }

    /// Access the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(table: &'static str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| {
            StoreError::CorruptRow {
                table,
                message: format!("bad timestamp '{raw}': {e}"),
            }
            .into()
        })
}

pub(crate) fn parse_optional_timestamp(
    table: &'static str,
    raw: Option<String>,
) -> Result<Option<DateTime<Utc>>> {
    raw.map(|value| parse_timestamp(table, &value)).transpose()
}

pub(crate) fn parse_enum<T: FromStr>(table: &'static str, raw: &str) -> Result<T> {
    T::from_str(raw).map_err(|_| {
        StoreError::CorruptRow {
            table,
            message: format!("unknown status '{raw}'"),
        }
        .into()
    })
}
