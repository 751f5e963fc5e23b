use super::{generate_session_token, hash_password, hash_token, verify_password};
use crate::error::AuthError;
use crate::store::{NewUser, Organization, SqliteStore, User};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

/// Registration input; `organization_name` creates and joins a new organization.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub organization_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    /// Plaintext token, returned to the client once and never stored.
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

pub async fn register(
    store: &SqliteStore,
    registration: Registration,
) -> Result<(User, Option<Organization>)> {
    let name = registration.name.trim();
    let email = normalize_email(&registration.email);
    if name.is_empty() || email.is_empty() || registration.password.is_empty() {
        return Err(AuthError::MissingFields.into());
    }

    let password_hash = hash_password(&registration.password)?;
    let organization_name = registration
        .organization_name
        .map(|org| org.trim().to_string())
        .filter(|org| !org.is_empty());

    let (user, organization) = store
        .create_user(NewUser {
            name: name.to_string(),
            email,
            password_hash,
            organization_name,
        })
        .await?;

    tracing::info!(user_id = %user.id, has_organization = organization.is_some(), "user registered");
    Ok((user, organization))
}

/// Check credentials and open a session lasting `ttl`.
pub async fn login(
    store: &SqliteStore,
    email: &str,
    password: &str,
    ttl: Duration,
) -> Result<LoginOutcome> {
    let email = normalize_email(email);
    let Some(credentials) = store.find_credentials(&email).await? else {
        return Err(AuthError::InvalidCredentials.into());
    };
    if !verify_password(password, &credentials.password_hash) {
        tracing::warn!(user_id = %credentials.user.id, "login rejected: wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = generate_session_token();
    let expires_at = Utc::now() + ttl;
    store
        .create_session(&hash_token(&token), &credentials.user.id, expires_at)
        .await?;

    tracing::info!(user_id = %credentials.user.id, "session opened");
    Ok(LoginOutcome {
        user: credentials.user,
        token,
        expires_at,
    })
}

pub async fn authenticate(store: &SqliteStore, token: &str) -> Result<Option<User>> {
    store.find_session_user(&hash_token(token), Utc::now()).await
}

pub async fn logout(store: &SqliteStore, token: &str) -> Result<bool> {
    store.delete_session(&hash_token(token)).await
}
