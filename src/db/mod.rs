use std::future::Future;
use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::error::AppError;

/// Upper bound for any single storage call made while serving a request.
pub const STORAGE_TIMEOUT: Duration = Duration::from_secs(5);

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(STORAGE_TIMEOUT)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Apply the migrations embedded from ./migrations/
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Runs a storage call under [`STORAGE_TIMEOUT`].
///
/// An elapsed deadline is an internal error and is not retried.
pub async fn bounded<T, F>(fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(STORAGE_TIMEOUT, fut).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => Err(AppError::internal("storage call timed out")),
    }
}

/// Grant `admin` to the account with this email, if it exists. Idempotent.
pub async fn bootstrap_admin(pool: &PgPool, email: &str) -> anyhow::Result<bool> {
    let granted = sqlx::query(
        "INSERT INTO user_roles (user_id, role_id)
         SELECT u.id, r.id
         FROM users u
         JOIN roles r ON r.name = 'admin'
         WHERE u.email = $1
         ON CONFLICT (user_id, role_id) DO NOTHING",
    )
    .bind(email)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(granted > 0)
}
