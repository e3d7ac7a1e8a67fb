use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Profile {
    pub id: i32,
    pub user_id: i32,
    pub first_name: String,
    pub last_name: Option<String>,
    pub birth_date: NaiveDate,
    pub avatar: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields parsed out of the multipart profile form. On update every field
/// is optional; on create `first_name` and `birth_date` are required.
#[derive(Debug, Default)]
pub struct ProfileForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub is_verified: Option<bool>,
    /// Public path of a freshly stored avatar, e.g. `/media/avatars/<uuid>.png`.
    pub avatar: Option<String>,
}

impl ProfileForm {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.birth_date.is_none()
            && self.is_verified.is_none()
            && self.avatar.is_none()
    }
}
