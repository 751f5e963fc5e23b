use super::organizations::map_organization_row;
use super::types::{NewUser, Organization, User, UserCredentials};
use super::{SqliteStore, parse_timestamp, timestamp};
use crate::error::AuthError;
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

const TABLE: &str = "users";
const USER_COLUMNS: &str = "id, name, email, organization_id, created_at";

pub(super) fn map_user_row(row: &SqliteRow) -> Result<User> {
    let created_at: String = row.try_get("created_at")?;
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        organization_id: row.try_get("organization_id")?,
        created_at: parse_timestamp(TABLE, &created_at)?,
    })
}

impl SqliteStore {
    /// Insert a user, optionally creating and joining a new organization in
    /// the same transaction. Fails with [`AuthError::UserExists`] on a
    /// duplicate email.
    pub async fn create_user(&self, new_user: NewUser) -> Result<(User, Option<Organization>)> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
            .bind(&new_user.email)
            .fetch_optional(&mut *tx)
            .await
            .context("check existing user")?;
        if existing.is_some() {
            return Err(AuthError::UserExists.into());
        }

        let organization = match new_user.organization_name.as_deref() {
            Some(name) => {
                let row = sqlx::query(
                    "INSERT INTO organizations (id, name, created_at)
                     VALUES ($1, $2, $3)
                     RETURNING id, name, created_at",
                )
                .bind(Uuid::new_v4().to_string())
                .bind(name)
                .bind(timestamp(now))
                .fetch_one(&mut *tx)
                .await
                .context("insert organization")?;
                Some(map_organization_row(&row)?)
            }
            None => None,
        };

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: new_user.name,
            email: new_user.email,
            organization_id: organization.as_ref().map(|org| org.id.clone()),
            created_at: now,
        };

        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, organization_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&new_user.password_hash)
        .bind(&user.organization_id)
        .bind(timestamp(user.created_at))
        .execute(&mut *tx)
        .await
        .context("insert user")?;

        tx.commit().await?;
        Ok((user, organization))
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("query user by id")?;

        row.map(|r| map_user_row(&r)).transpose()
    }

    pub async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("query user by email")?;

        row.map(|r| {
            Ok(UserCredentials {
                user: map_user_row(&r)?,
                password_hash: r.try_get("password_hash")?,
            })
        })
        .transpose()
    }

    pub async fn count_users(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .context("count users")?;
        Ok(count)
    }
}
