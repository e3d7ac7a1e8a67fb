use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::{db::bounded, AppState};

/// GET /
pub async fn service_info() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "api_name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match bounded(sqlx::query("SELECT 1").execute(&state.db)).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "db": "connected" })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "error", "db": "unavailable" })),
            )
        }
    }
}
