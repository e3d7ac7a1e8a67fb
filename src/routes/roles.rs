use axum::extract::State;
use serde_json::Value;

use crate::{
    error::AppResult,
    models::{
        auth::Identity,
        role::{AssignRoleRequest, CreateRoleRequest},
    },
    routes::{
        extract::{Json, Path},
        ok,
    },
    services::roles::RoleService,
    AppState,
};

pub async fn list_roles(State(state): State<AppState>) -> AppResult<Json<Value>> {
    Ok(ok("Roles retrieved", RoleService::list(&state.db).await?))
}

pub async fn get_role(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Value>> {
    Ok(ok("Role retrieved", RoleService::get(&state.db, id).await?))
}

pub async fn create_role(
    State(state): State<AppState>,
    Json(body): Json<CreateRoleRequest>,
) -> AppResult<Json<Value>> {
    let role = RoleService::create(&state.db, &body.name).await?;
    tracing::info!(role_id = role.id, name = %role.name, "role created");
    Ok(ok("Role created", role))
}

pub async fn delete_role(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Value>> {
    RoleService::delete(&state.db, id).await?;
    tracing::info!(role_id = id, "role deleted");
    Ok(ok("Role deleted", ()))
}

/// GET /api/v1/role: the caller's own roles.
pub async fn my_roles(State(state): State<AppState>, identity: Identity) -> AppResult<Json<Value>> {
    let roles = RoleService::roles_of(&state.db, identity.user_id).await?;
    Ok(ok("Roles retrieved", roles))
}

pub async fn user_roles(State(state): State<AppState>, Path(user_id): Path<i32>) -> AppResult<Json<Value>> {
    let roles = RoleService::roles_of(&state.db, user_id).await?;
    Ok(ok("User roles retrieved", roles))
}

/// PUT /api/v1/users/{id}/role: the user ends up with exactly this role.
pub async fn replace_user_role(
    State(state): State<AppState>,
    identity: Identity,
    Path(user_id): Path<i32>,
    Json(body): Json<AssignRoleRequest>,
) -> AppResult<Json<Value>> {
    RoleService::replace(&state.db, user_id, body.role_id).await?;
    tracing::info!(by = identity.user_id, user_id, role_id = body.role_id, "user role replaced");
    Ok(ok("User role updated", ()))
}

pub async fn assign_user_role(
    State(state): State<AppState>,
    identity: Identity,
    Path(user_id): Path<i32>,
    Json(body): Json<AssignRoleRequest>,
) -> AppResult<Json<Value>> {
    RoleService::assign(&state.db, user_id, body.role_id).await?;
    tracing::info!(by = identity.user_id, user_id, role_id = body.role_id, "role assigned");
    Ok(ok("Role assigned", ()))
}

pub async fn revoke_user_role(
    State(state): State<AppState>,
    identity: Identity,
    Path((user_id, role_id)): Path<(i32, i32)>,
) -> AppResult<Json<Value>> {
    RoleService::revoke(&state.db, user_id, role_id).await?;
    tracing::info!(by = identity.user_id, user_id, role_id, "role revoked");
    Ok(ok("Role removed", ()))
}
