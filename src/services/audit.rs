use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    db::{bounded, STORAGE_TIMEOUT},
    error::AppResult,
    models::{
        audit::{AuditEntry, AuditLogRow},
        pagination::{Paginated, Pagination},
    },
    services::metrics::AUDIT_WRITE_FAILURES_COUNTER,
};

/// Append-only sink for audit entries.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn insert(&self, entry: &AuditEntry) -> AppResult<()>;
}

pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for PgAuditStore {
    async fn insert(&self, entry: &AuditEntry) -> AppResult<()> {
        bounded(
            sqlx::query(
                "INSERT INTO audit_logs (user_id, method, url, status, ip, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(entry.user_id)
            .bind(&entry.method)
            .bind(&entry.url)
            .bind(i32::from(entry.status))
            .bind(&entry.ip)
            .bind(entry.at)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}

/// Fire-and-forget front for an [`AuditStore`].
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn AuditStore>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Spawns the write and returns immediately. A failed or slow write is
    /// logged and counted, never reported to the caller.
    pub fn record(&self, entry: AuditEntry) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            match tokio::time::timeout(STORAGE_TIMEOUT, store.insert(&entry)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    AUDIT_WRITE_FAILURES_COUNTER.inc();
                    tracing::warn!(url = %entry.url, "audit log insert failed: {e}");
                }
                Err(_) => {
                    AUDIT_WRITE_FAILURES_COUNTER.inc();
                    tracing::warn!(url = %entry.url, "audit log insert timed out");
                }
            }
        });
    }
}

pub struct AuditService;

impl AuditService {
    /// Newest first.
    pub async fn list(pool: &PgPool, page: Pagination) -> AppResult<Paginated<AuditLogRow>> {
        let total: i64 =
            bounded(sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs").fetch_one(pool)).await?;
        let rows = bounded(
            sqlx::query_as::<_, AuditLogRow>(
                "SELECT id, user_id, method, url, status, ip, created_at
                 FROM audit_logs
                 ORDER BY created_at DESC, id DESC
                 LIMIT $1 OFFSET $2",
            )
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(pool),
        )
        .await?;
        Ok(Paginated::new(rows, total, page))
    }
}
