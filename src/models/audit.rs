use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// One gated request's outcome. Append-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub user_id: Option<i32>,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub ip: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct AuditLogRow {
    pub id: i64,
    pub user_id: Option<i32>,
    pub method: String,
    pub url: String,
    pub status: i32,
    pub ip: Option<String>,
    pub created_at: DateTime<Utc>,
}
