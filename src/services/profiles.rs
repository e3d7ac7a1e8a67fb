use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use chrono::NaiveDate;
use image::ImageFormat;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    db::bounded,
    error::{AppError, AppResult},
    models::{
        pagination::{Paginated, Pagination},
        profile::{Profile, ProfileForm},
    },
};

const PROFILE_COLUMNS: &str =
    "id, user_id, first_name, last_name, birth_date, avatar, is_verified, created_at, updated_at";

/// Public URL prefix under which `MEDIA_DIR` is served.
pub const MEDIA_URL_PREFIX: &str = "/media";
const AVATAR_SUBDIR: &str = "avatars";

pub struct ProfileService;

impl ProfileService {
    pub async fn list(pool: &PgPool, page: Pagination) -> AppResult<Paginated<Profile>> {
        let total: i64 =
            bounded(sqlx::query_scalar("SELECT COUNT(*) FROM profiles").fetch_one(pool)).await?;
        let profiles = bounded(
            sqlx::query_as::<_, Profile>(&format!(
                "SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY id LIMIT $1 OFFSET $2"
            ))
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(pool),
        )
        .await?;
        Ok(Paginated::new(profiles, total, page))
    }

    pub async fn get(pool: &PgPool, id: i32) -> AppResult<Profile> {
        bounded(
            sqlx::query_as::<_, Profile>(&format!(
                "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(pool),
        )
        .await?
        .ok_or_else(|| AppError::not_found("Profile not found"))
    }

    pub async fn get_by_user(pool: &PgPool, user_id: i32) -> AppResult<Profile> {
        bounded(
            sqlx::query_as::<_, Profile>(&format!(
                "SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1"
            ))
            .bind(user_id)
            .fetch_optional(pool),
        )
        .await?
        .ok_or_else(|| AppError::not_found("Profile not found"))
    }

    /// One profile per user: a second create is a `Conflict`.
    pub async fn create(pool: &PgPool, user_id: i32, form: ProfileForm) -> AppResult<Profile> {
        let first_name = form
            .first_name
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::bad_request("first_name is required"))?;
        let birth_date = form
            .birth_date
            .ok_or_else(|| AppError::bad_request("birth_date is required"))?;

        let user_exists = bounded(
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
                .bind(user_id)
                .fetch_one(pool),
        )
        .await?;
        if !user_exists {
            return Err(AppError::not_found("User not found"));
        }

        bounded(
            sqlx::query_as::<_, Profile>(&format!(
                "INSERT INTO profiles (user_id, first_name, last_name, birth_date, avatar, is_verified)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING {PROFILE_COLUMNS}"
            ))
            .bind(user_id)
            .bind(first_name.trim())
            .bind(form.last_name)
            .bind(birth_date)
            .bind(form.avatar)
            .bind(form.is_verified.unwrap_or(false))
            .fetch_one(pool),
        )
        .await
        .map_err(|e| match e {
            AppError::Conflict(_) => AppError::conflict("Profile already exists for this user"),
            other => other,
        })
    }

    /// Partial update. Returns the updated row and the avatar it replaced,
    /// if any, so the caller can drop the old file.
    pub async fn update(
        pool: &PgPool,
        user_id: i32,
        form: ProfileForm,
    ) -> AppResult<(Profile, Option<String>)> {
        if form.is_empty() {
            return Err(AppError::bad_request("Nothing to update"));
        }
        if form.first_name.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(AppError::bad_request("first_name cannot be empty"));
        }

        let current = Self::get_by_user(pool, user_id).await?;
        let profile = bounded(
            sqlx::query_as::<_, Profile>(&format!(
                "UPDATE profiles
                 SET first_name = COALESCE($1, first_name),
                     last_name = COALESCE($2, last_name),
                     birth_date = COALESCE($3, birth_date),
                     avatar = COALESCE($4, avatar),
                     is_verified = COALESCE($5, is_verified),
                     updated_at = NOW()
                 WHERE user_id = $6
                 RETURNING {PROFILE_COLUMNS}"
            ))
            .bind(form.first_name.as_deref().map(str::trim))
            .bind(form.last_name)
            .bind(form.birth_date)
            .bind(form.avatar.as_deref())
            .bind(form.is_verified)
            .bind(user_id)
            .fetch_optional(pool),
        )
        .await?
        .ok_or_else(|| AppError::not_found("Profile not found"))?;

        let replaced = match (form.avatar, current.avatar) {
            (Some(new), Some(old)) if new != old => Some(old),
            _ => None,
        };
        Ok((profile, replaced))
    }

    /// Deletes the row and returns its avatar path, if any.
    pub async fn delete(pool: &PgPool, user_id: i32) -> AppResult<Option<String>> {
        bounded(
            sqlx::query_scalar::<_, Option<String>>(
                "DELETE FROM profiles WHERE user_id = $1 RETURNING avatar",
            )
            .bind(user_id)
            .fetch_optional(pool),
        )
        .await?
        .ok_or_else(|| AppError::not_found("Profile not found"))
    }
}

/// Reads the multipart profile form. An `avatar` file part is validated
/// and written under `media_dir` before the row is touched.
pub async fn read_profile_form(mut multipart: Multipart, media_dir: &str) -> AppResult<ProfileForm> {
    let mut form = ProfileForm::default();
    let mut avatar: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "avatar" {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::bad_request(format!("Invalid avatar upload: {e}")))?;
            if !bytes.is_empty() {
                avatar = Some(bytes.to_vec());
            }
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| AppError::bad_request(format!("Invalid field {name}: {e}")))?;
        let text = text.trim().to_string();
        match name.as_str() {
            "first_name" => form.first_name = Some(text),
            "last_name" => form.last_name = Some(text).filter(|s| !s.is_empty()),
            "birth_date" if !text.is_empty() => {
                form.birth_date = Some(parse_birth_date(&text)?);
            }
            "is_verified" if !text.is_empty() => {
                form.is_verified = Some(parse_bool(&text)?);
            }
            _ => {}
        }
    }

    if let Some(bytes) = avatar {
        form.avatar = Some(store_avatar(Path::new(media_dir), &bytes).await?);
    }
    Ok(form)
}

fn parse_birth_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request("birth_date must be YYYY-MM-DD"))
}

fn parse_bool(raw: &str) -> AppResult<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(AppError::bad_request("is_verified must be true or false")),
    }
}

fn avatar_extension(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("png"),
        ImageFormat::Jpeg => Some("jpg"),
        ImageFormat::WebP => Some("webp"),
        ImageFormat::Gif => Some("gif"),
        _ => None,
    }
}

/// Sniffs and fully decodes the upload, then stores it as
/// `<media_dir>/avatars/<uuid>.<ext>`. Returns the public path.
pub async fn store_avatar(media_dir: &Path, bytes: &[u8]) -> AppResult<String> {
    let unsupported = || AppError::bad_request("Avatar must be a PNG, JPEG, WEBP or GIF image");

    let format = image::guess_format(bytes).map_err(|_| unsupported())?;
    let ext = avatar_extension(format).ok_or_else(unsupported)?;
    image::load_from_memory_with_format(bytes, format).map_err(|_| unsupported())?;

    let dir = media_dir.join(AVATAR_SUBDIR);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::internal(format!("create avatar dir: {e}")))?;

    let filename = format!("{}.{ext}", Uuid::new_v4());
    tokio::fs::write(dir.join(&filename), bytes)
        .await
        .map_err(|e| AppError::internal(format!("write avatar: {e}")))?;

    Ok(format!("{MEDIA_URL_PREFIX}/{AVATAR_SUBDIR}/{filename}"))
}

/// Best effort: a missing file is not an error.
pub async fn remove_avatar(media_dir: &str, public_path: &str) {
    let Some(path) = avatar_file(media_dir, public_path) else {
        return;
    };
    if let Err(e) = tokio::fs::remove_file(&path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), "failed to remove avatar: {e}");
        }
    }
}

/// Maps a public avatar path back onto disk, refusing anything that is not
/// a plain file name inside the avatar directory.
fn avatar_file(media_dir: &str, public_path: &str) -> Option<PathBuf> {
    let name = public_path.strip_prefix(&format!("{MEDIA_URL_PREFIX}/{AVATAR_SUBDIR}/"))?;
    if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
        return None;
    }
    Some(Path::new(media_dir).join(AVATAR_SUBDIR).join(name))
}
