use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `Covenant`.
///
/// Each subsystem defines its own error variant. The gateway downcasts to
/// these to pick an HTTP status; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum CovenantError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Store ───────────────────────────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── E-signature provider ────────────────────────────────────────────
    #[error("esign: {0}")]
    Esign(#[from] EsignError),

    // ── Signing orchestration ───────────────────────────────────────────
    #[error("signing: {0}")]
    Signing(#[from] SigningError),

    // ── AI analysis ─────────────────────────────────────────────────────
    #[error("analysis: {0}")]
    Analysis(#[from] AnalysisError),

    // ── Accounts / sessions ─────────────────────────────────────────────
    #[error("auth: {0}")]
    Auth(#[from] AuthError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Store errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("schema bootstrap failed: {0}")]
    Schema(String),

    #[error("corrupt row in {table}: {message}")]
    CorruptRow { table: &'static str, message: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

// ─── E-signature errors ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EsignError {
    #[error("{provider} is not authorized; complete the OAuth flow first")]
    NotAuthorized { provider: String },

    #[error("{provider} access token expired; reauthorize")]
    TokenExpired { provider: String },

    #[error("unknown or expired OAuth state")]
    UnknownState,

    #[error("{provider} is missing configuration: {field}")]
    NotConfigured {
        provider: String,
        field: &'static str,
    },

    #[error("{provider} request failed: {message}")]
    Request { provider: String, message: String },
}

// ─── Signing errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("signer email and name are required")]
    MissingSigner,

    #[error("agreement is {status} and can no longer be sent for signature")]
    NotSignable { status: String },
}

// ─── Analysis errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("agreement content is empty")]
    EmptyContent,

    #[error("{provider} API key is not configured")]
    NotConfigured { provider: String },

    #[error("{provider} request failed: {message}")]
    Request { provider: String, message: String },

    #[error("failed to parse analysis response: {0}")]
    Parse(String),

    #[error("invalid analysis response: {0}")]
    Invalid(String),
}

// ─── Auth errors ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user already exists")]
    UserExists,

    #[error("name, email and password are required")]
    MissingFields,

    #[error("password hashing failed: {0}")]
    Hash(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, CovenantError>;
