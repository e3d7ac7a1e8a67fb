use axum::extract::{
    multipart::{Multipart, MultipartRejection},
    State,
};
use serde_json::Value;

use crate::{
    error::AppResult,
    models::{
        auth::Identity,
        pagination::{PageQuery, Pagination},
    },
    routes::{
        extract::{Json, Path, Query},
        ok,
    },
    services::profiles::{read_profile_form, remove_avatar, ProfileService},
    AppState,
};

/// GET /api/v1/profiles
pub async fn list_profiles(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Value>> {
    let page = ProfileService::list(&state.db, Pagination::resolve(&query)).await?;
    Ok(ok("Profiles retrieved", page))
}

/// GET /api/v1/profiles/{id} and /api/v1/admin/profile/{id}, by profile id.
pub async fn get_profile(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Value>> {
    let profile = ProfileService::get(&state.db, id).await?;
    Ok(ok("Profile retrieved", profile))
}

/// GET /api/v1/profile
pub async fn my_profile(State(state): State<AppState>, identity: Identity) -> AppResult<Json<Value>> {
    let profile = ProfileService::get_by_user(&state.db, identity.user_id).await?;
    Ok(ok("Profile retrieved", profile))
}

/// GET /api/v1/users/{id}/profile
pub async fn get_user_profile(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Value>> {
    let profile = ProfileService::get_by_user(&state.db, user_id).await?;
    Ok(ok("Profile retrieved", profile))
}

/// POST /api/v1/users/{id}/profile (multipart)
pub async fn create_user_profile(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<Value>> {
    let media_dir = &state.config.media_dir;
    let form = read_profile_form(multipart?, media_dir).await?;
    let uploaded = form.avatar.clone();

    match ProfileService::create(&state.db, user_id, form).await {
        Ok(profile) => {
            tracing::info!(user_id, profile_id = profile.id, "profile created");
            Ok(ok("Profile created", profile))
        }
        Err(e) => {
            if let Some(path) = uploaded {
                remove_avatar(media_dir, &path).await;
            }
            Err(e)
        }
    }
}

/// PUT /api/v1/users/{id}/profile (multipart, partial)
pub async fn update_user_profile(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<Value>> {
    let media_dir = &state.config.media_dir;
    let form = read_profile_form(multipart?, media_dir).await?;
    let uploaded = form.avatar.clone();

    match ProfileService::update(&state.db, user_id, form).await {
        Ok((profile, replaced)) => {
            if let Some(old) = replaced {
                remove_avatar(media_dir, &old).await;
            }
            Ok(ok("Profile updated", profile))
        }
        Err(e) => {
            if let Some(path) = uploaded {
                remove_avatar(media_dir, &path).await;
            }
            Err(e)
        }
    }
}

/// DELETE /api/v1/users/{id}/profile
pub async fn delete_user_profile(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Value>> {
    if let Some(avatar) = ProfileService::delete(&state.db, user_id).await? {
        remove_avatar(&state.config.media_dir, &avatar).await;
    }
    tracing::info!(user_id, "profile deleted");
    Ok(ok("Profile deleted", ()))
}
