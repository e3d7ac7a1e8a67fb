use sqlx::PgPool;

use crate::{
    db::bounded,
    error::{AppError, AppResult},
    models::{
        pagination::{Paginated, Pagination},
        role::DEFAULT_ROLE,
        user::{CreateUserRequest, UpdateUserRequest, User},
    },
    services::password::hash_password,
};

const USER_COLUMNS: &str = "id, email, password_hash, created_at, updated_at";

pub struct UserService;

impl UserService {
    pub async fn list(pool: &PgPool, page: Pagination) -> AppResult<Paginated<User>> {
        let total: i64 =
            bounded(sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(pool)).await?;
        let users = bounded(
            sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT $1 OFFSET $2"
            ))
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(pool),
        )
        .await?;
        Ok(Paginated::new(users, total, page))
    }

    pub async fn get(pool: &PgPool, id: i32) -> AppResult<User> {
        bounded(
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(pool),
        )
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Admin-side account creation. The new account gets the default role.
    pub async fn create(pool: &PgPool, req: &CreateUserRequest, cost: u32) -> AppResult<User> {
        let email = req.email.trim();
        if email.is_empty() || req.password.is_empty() {
            return Err(AppError::bad_request("Email and password are required"));
        }
        let hash = hash_password(&req.password, cost)?;

        let mut tx = bounded(pool.begin()).await?;
        let user = bounded(
            sqlx::query_as::<_, User>(&format!(
                "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING {USER_COLUMNS}"
            ))
            .bind(email)
            .bind(&hash)
            .fetch_one(&mut *tx),
        )
        .await
        .map_err(email_taken)?;

        bounded(
            sqlx::query(
                "INSERT INTO user_roles (user_id, role_id)
                 SELECT $1, id FROM roles WHERE name = $2",
            )
            .bind(user.id)
            .bind(DEFAULT_ROLE)
            .execute(&mut *tx),
        )
        .await?;
        bounded(tx.commit()).await?;

        Ok(user)
    }

    pub async fn update(
        pool: &PgPool,
        id: i32,
        req: &UpdateUserRequest,
        cost: u32,
    ) -> AppResult<User> {
        let email = req.email.as_deref().map(str::trim);
        if email.is_some_and(str::is_empty) || req.password.as_deref().is_some_and(str::is_empty) {
            return Err(AppError::bad_request("Email and password cannot be empty"));
        }
        if email.is_none() && req.password.is_none() {
            return Err(AppError::bad_request("Nothing to update"));
        }

        let hash = req
            .password
            .as_deref()
            .map(|p| hash_password(p, cost))
            .transpose()?;

        bounded(
            sqlx::query_as::<_, User>(&format!(
                "UPDATE users
                 SET email = COALESCE($1, email),
                     password_hash = COALESCE($2, password_hash),
                     updated_at = NOW()
                 WHERE id = $3
                 RETURNING {USER_COLUMNS}"
            ))
            .bind(email)
            .bind(hash)
            .bind(id)
            .fetch_optional(pool),
        )
        .await
        .map_err(email_taken)?
        .ok_or_else(|| AppError::not_found("User not found"))
    }

    pub async fn delete(pool: &PgPool, id: i32) -> AppResult<()> {
        let deleted = bounded(sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(pool))
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(AppError::not_found("User not found"));
        }
        Ok(())
    }
}

fn email_taken(e: AppError) -> AppError {
    match e {
        AppError::Conflict(_) => AppError::conflict("Email already registered"),
        other => other,
    }
}
