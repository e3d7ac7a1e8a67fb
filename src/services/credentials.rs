use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use crate::{
    db::bounded,
    error::{AppError, AppResult},
    models::{
        role::DEFAULT_ROLE,
        user::{CredentialRecord, UserSummary},
    },
};

/// The slice of the user store the authentication flows depend on.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<CredentialRecord>>;

    /// New account holding the default role. `Conflict` if the email is taken.
    async fn create_user(&self, email: &str, password_hash: &str) -> AppResult<UserSummary>;

    /// Maps an externally verified email to exactly one local account,
    /// provisioning a password-less one on first sight.
    async fn find_or_create_oauth_user(&self, email: &str) -> AppResult<UserSummary>;

    async fn user_exists(&self, user_id: i32) -> AppResult<bool>;

    /// `NotFound` if no such user.
    async fn update_password(&self, user_id: i32, password_hash: &str) -> AppResult<()>;
}

pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn grant_default_role(conn: &mut PgConnection, user_id: i32) -> AppResult<()> {
    bounded(
        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id)
             SELECT $1, id FROM roles WHERE name = $2
             ON CONFLICT (user_id, role_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(DEFAULT_ROLE)
        .execute(conn),
    )
    .await?;
    Ok(())
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<CredentialRecord>> {
        let row = bounded(
            sqlx::query_as::<_, (i32, String, Option<String>)>(
                "SELECT id, email, password_hash FROM users WHERE email = $1",
            )
            .bind(email)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.map(|(user_id, email, password_hash)| CredentialRecord {
            user_id,
            email,
            password_hash,
        }))
    }

    async fn create_user(&self, email: &str, password_hash: &str) -> AppResult<UserSummary> {
        let mut tx = bounded(self.pool.begin()).await?;

        let (id, email) = bounded(
            sqlx::query_as::<_, (i32, String)>(
                "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING id, email",
            )
            .bind(email)
            .bind(password_hash)
            .fetch_one(&mut *tx),
        )
        .await
        .map_err(|e| match e {
            AppError::Conflict(_) => AppError::conflict("Email already registered"),
            other => other,
        })?;

        grant_default_role(&mut tx, id).await?;
        bounded(tx.commit()).await?;

        Ok(UserSummary { id, email })
    }

    async fn find_or_create_oauth_user(&self, email: &str) -> AppResult<UserSummary> {
        let mut tx = bounded(self.pool.begin()).await?;

        let inserted = bounded(
            sqlx::query_as::<_, (i32, String)>(
                "INSERT INTO users (email, password_hash) VALUES ($1, NULL)
                 ON CONFLICT (email) DO NOTHING
                 RETURNING id, email",
            )
            .bind(email)
            .fetch_optional(&mut *tx),
        )
        .await?;

        let (id, email) = match inserted {
            Some(row) => {
                grant_default_role(&mut tx, row.0).await?;
                tracing::info!(user_id = row.0, "provisioned account from OAuth login");
                row
            }
            None => {
                bounded(
                    sqlx::query_as::<_, (i32, String)>("SELECT id, email FROM users WHERE email = $1")
                        .bind(email)
                        .fetch_one(&mut *tx),
                )
                .await?
            }
        };
        bounded(tx.commit()).await?;

        Ok(UserSummary { id, email })
    }

    async fn user_exists(&self, user_id: i32) -> AppResult<bool> {
        bounded(
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
                .bind(user_id)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn update_password(&self, user_id: i32, password_hash: &str) -> AppResult<()> {
        let updated = bounded(
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
                .bind(password_hash)
                .bind(user_id)
                .execute(&self.pool),
        )
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(AppError::not_found("User not found"));
        }
        Ok(())
    }
}
