use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    db::bounded,
    error::{AppError, AppResult},
    models::role::Role,
};

/// Answers "does this identity hold role R" for the access gate.
///
/// A lookup that cannot be completed is an error, never a silent `false`.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    async fn has_role(&self, user_id: i32, role: &str) -> AppResult<bool>;
}

pub struct PgRoleDirectory {
    pool: PgPool,
}

impl PgRoleDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleDirectory for PgRoleDirectory {
    async fn has_role(&self, user_id: i32, role: &str) -> AppResult<bool> {
        bounded(
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (
                    SELECT 1 FROM user_roles ur
                    JOIN roles r ON r.id = ur.role_id
                    WHERE ur.user_id = $1 AND r.name = $2
                 )",
            )
            .bind(user_id)
            .bind(role)
            .fetch_one(&self.pool),
        )
        .await
    }
}

pub struct RoleService;

impl RoleService {
    pub async fn list(pool: &PgPool) -> AppResult<Vec<Role>> {
        bounded(sqlx::query_as::<_, Role>("SELECT id, name FROM roles ORDER BY id").fetch_all(pool))
            .await
    }

    pub async fn get(pool: &PgPool, id: i32) -> AppResult<Role> {
        bounded(
            sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE id = $1")
                .bind(id)
                .fetch_optional(pool),
        )
        .await?
        .ok_or_else(|| AppError::not_found("Role not found"))
    }

    pub async fn create(pool: &PgPool, name: &str) -> AppResult<Role> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request("Role name is required"));
        }
        bounded(
            sqlx::query_as::<_, Role>("INSERT INTO roles (name) VALUES ($1) RETURNING id, name")
                .bind(name)
                .fetch_one(pool),
        )
        .await
        .map_err(|e| match e {
            AppError::Conflict(_) => AppError::conflict("Role already exists"),
            other => other,
        })
    }

    pub async fn delete(pool: &PgPool, id: i32) -> AppResult<()> {
        let deleted = bounded(sqlx::query("DELETE FROM roles WHERE id = $1").bind(id).execute(pool))
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(AppError::not_found("Role not found"));
        }
        Ok(())
    }

    /// Roles held by one user, ordered by role id.
    pub async fn roles_of(pool: &PgPool, user_id: i32) -> AppResult<Vec<Role>> {
        bounded(
            sqlx::query_as::<_, Role>(
                "SELECT r.id, r.name FROM roles r
                 JOIN user_roles ur ON ur.role_id = r.id
                 WHERE ur.user_id = $1
                 ORDER BY r.id",
            )
            .bind(user_id)
            .fetch_all(pool),
        )
        .await
    }

    /// Adds a role. Assigning a role the user already holds is a no-op.
    pub async fn assign(pool: &PgPool, user_id: i32, role_id: i32) -> AppResult<()> {
        Self::ensure_user_and_role(pool, user_id, role_id).await?;
        bounded(
            sqlx::query(
                "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)
                 ON CONFLICT (user_id, role_id) DO NOTHING",
            )
            .bind(user_id)
            .bind(role_id)
            .execute(pool),
        )
        .await?;
        Ok(())
    }

    /// Replace every role the user holds with exactly `role_id`, atomically.
    pub async fn replace(pool: &PgPool, user_id: i32, role_id: i32) -> AppResult<()> {
        Self::ensure_user_and_role(pool, user_id, role_id).await?;

        let mut tx = bounded(pool.begin()).await?;
        bounded(
            sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx),
        )
        .await?;
        bounded(
            sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(role_id)
                .execute(&mut *tx),
        )
        .await?;
        bounded(tx.commit()).await?;
        Ok(())
    }

    pub async fn revoke(pool: &PgPool, user_id: i32, role_id: i32) -> AppResult<()> {
        let removed = bounded(
            sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
                .bind(user_id)
                .bind(role_id)
                .execute(pool),
        )
        .await?
        .rows_affected();
        if removed == 0 {
            return Err(AppError::not_found("User does not hold this role"));
        }
        Ok(())
    }

    async fn ensure_user_and_role(pool: &PgPool, user_id: i32, role_id: i32) -> AppResult<()> {
        let (user_exists, role_exists) = bounded(
            sqlx::query_as::<_, (bool, bool)>(
                "SELECT EXISTS (SELECT 1 FROM users WHERE id = $1),
                        EXISTS (SELECT 1 FROM roles WHERE id = $2)",
            )
            .bind(user_id)
            .bind(role_id)
            .fetch_one(pool),
        )
        .await?;

        if !user_exists {
            return Err(AppError::not_found("User not found"));
        }
        if !role_exists {
            return Err(AppError::not_found("Role not found"));
        }
        Ok(())
    }
}
