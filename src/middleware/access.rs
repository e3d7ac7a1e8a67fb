use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    error::{AppError, AppResult},
    models::{auth::Identity, role::ADMIN_ROLE},
    services::roles::RoleDirectory,
};

pub type Roles = Arc<dyn RoleDirectory>;

/// AdminOnly as a pure decision.
pub fn require_admin(is_admin: bool) -> AppResult<()> {
    if is_admin {
        Ok(())
    } else {
        Err(AppError::forbidden("Admin access required"))
    }
}

/// OwnerOrAdmin as a pure decision.
pub fn require_owner_or_admin(identity: Identity, owner_id: i32, is_admin: bool) -> AppResult<()> {
    if identity.user_id == owner_id || is_admin {
        Ok(())
    } else {
        Err(AppError::forbidden("You can only access your own resources"))
    }
}

/// Storage failures surface as errors, never as "not an admin".
pub async fn is_admin(roles: &dyn RoleDirectory, identity: Identity) -> AppResult<bool> {
    roles.has_role(identity.user_id, ADMIN_ROLE).await
}

pub async fn admin_only(
    State(roles): State<Roles>,
    identity: Identity,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let admin = is_admin(roles.as_ref(), identity).await?;
    if let Err(e) = require_admin(admin) {
        tracing::warn!(user_id = identity.user_id, path = %req.uri().path(), "admin route refused");
        return Err(e);
    }
    Ok(next.run(req).await)
}

/// The resource owner is the `{id}` segment of the matched route.
pub async fn owner_or_admin(
    State(roles): State<Roles>,
    identity: Identity,
    Path(params): Path<HashMap<String, String>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let owner_id: i32 = params
        .get("id")
        .ok_or_else(|| AppError::internal("owner check on a route without an {id} segment"))?
        .parse()
        .map_err(|_| AppError::bad_request("Invalid id"))?;

    // The owner never needs the role lookup.
    let admin = identity.user_id != owner_id && is_admin(roles.as_ref(), identity).await?;
    if let Err(e) = require_owner_or_admin(identity, owner_id, admin) {
        tracing::warn!(
            user_id = identity.user_id,
            owner_id,
            path = %req.uri().path(),
            "owner check refused"
        );
        return Err(e);
    }
    Ok(next.run(req).await)
}
