use axum::extract::State;
use serde_json::Value;

use crate::{
    error::AppResult,
    models::{
        pagination::{PageQuery, Pagination},
        user::{CreateUserRequest, UpdateUserRequest},
    },
    routes::{
        extract::{Json, Path, Query},
        ok,
    },
    services::users::UserService,
    AppState,
};

/// GET /api/v1/users
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Value>> {
    let page = UserService::list(&state.db, Pagination::resolve(&query)).await?;
    Ok(ok("Users retrieved", page))
}

/// GET /api/v1/users/{id}
pub async fn get_user(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Value>> {
    let user = UserService::get(&state.db, id).await?;
    Ok(ok("User retrieved", user))
}

/// POST /api/v1/users
pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> AppResult<Json<Value>> {
    let user = UserService::create(&state.db, &body, state.config.bcrypt_cost).await?;
    tracing::info!(user_id = user.id, "user created");
    Ok(ok("User created", user))
}

/// PUT /api/v1/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateUserRequest>,
) -> AppResult<Json<Value>> {
    let user = UserService::update(&state.db, id, &body, state.config.bcrypt_cost).await?;
    Ok(ok("User updated", user))
}

/// DELETE /api/v1/users/{id}
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Value>> {
    UserService::delete(&state.db, id).await?;
    tracing::info!(user_id = id, "user deleted");
    Ok(ok("User deleted", ()))
}
