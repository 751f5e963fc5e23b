use super::types::{Organization, User};
use super::{SqliteStore, parse_timestamp, timestamp};
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

const TABLE: &str = "organizations";

pub(super) fn map_organization_row(row: &SqliteRow) -> Result<Organization> {
    let created_at: String = row.try_get("created_at")?;
    Ok(Organization {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        created_at: parse_timestamp(TABLE, &created_at)?,
    })
}

impl SqliteStore {
    pub async fn get_organization(&self, id: &str) -> Result<Option<Organization>> {
        let row = sqlx::query("SELECT id, name, created_at FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("query organization by id")?;

        row.map(|r| map_organization_row(&r)).transpose()
    }

    /// Create an organization and move `user_id` into it, atomically.
    pub async fn create_organization_for_user(
        &self,
        user_id: &str,
        name: &str,
    ) -> Result<(Organization, User)> {
        let organization = Organization {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO organizations (id, name, created_at) VALUES ($1, $2, $3)")
            .bind(&organization.id)
            .bind(&organization.name)
            .bind(timestamp(organization.created_at))
            .execute(&mut *tx)
            .await
            .context("insert organization")?;

        let updated = sqlx::query("UPDATE users SET organization_id = $1 WHERE id = $2")
            .bind(&organization.id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("assign user organization")?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(crate::error::StoreError::NotFound {
                entity: "user",
                id: user_id.to_string(),
            }
            .into());
        }

        tx.commit().await?;

        let user = self
            .get_user(user_id)
            .await?
            .context("user vanished after organization assignment")?;
        Ok((organization, user))
    }

    /// Return the user's organization, creating "<name>'s Organization" when
    /// they have none. The flag is true when a new organization was created.
    pub async fn ensure_default_organization(&self, user: &User) -> Result<(Organization, bool)> {
        if let Some(org_id) = user.organization_id.as_deref()
            && let Some(existing) = self.get_organization(org_id).await?
        {
            return Ok((existing, false));
        }

        let name = format!("{}'s Organization", user.name);
        let (organization, _) = self.create_organization_for_user(&user.id, &name).await?;
        Ok((organization, true))
    }
}
