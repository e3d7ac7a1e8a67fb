use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::{
    middleware::client_ip::client_ip,
    models::{audit::AuditEntry, auth::Identity},
    services::audit::AuditRecorder,
};

#[derive(Clone)]
pub struct AuditState {
    pub recorder: AuditRecorder,
    pub trust_proxy_headers: bool,
}

/// Runs the handler, then hands the outcome to the recorder. The response
/// is returned whatever happens to the write.
pub async fn audit(State(state): State<AuditState>, req: Request, next: Next) -> Response {
    let user_id = req.extensions().get::<Identity>().map(|i| i.user_id);
    let ip = client_ip(&req, state.trust_proxy_headers);
    let method = req.method().to_string();
    let url = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let started = Instant::now();
    let response = next.run(req).await;
    let status = response.status().as_u16();

    tracing::info!(
        user_id = ?user_id,
        client_ip = %ip,
        %method,
        %url,
        status,
        duration_ms = started.elapsed().as_millis() as u64,
        "audit"
    );

    state.recorder.record(AuditEntry {
        user_id,
        method,
        url,
        status,
        ip: ip.to_string(),
        at: Utc::now(),
    });

    response
}
