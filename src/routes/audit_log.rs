use axum::extract::State;
use serde_json::Value;

use crate::{
    error::AppResult,
    models::pagination::{PageQuery, Pagination},
    routes::{
        extract::{Json, Query},
        ok,
    },
    services::audit::AuditService,
    AppState,
};

/// GET /api/v1/audit-logs, newest first.
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Value>> {
    let page = AuditService::list(&state.db, Pagination::resolve(&query)).await?;
    Ok(ok("Audit logs retrieved", page))
}
