use prometheus::{Encoder, TextEncoder};

use crate::error::{AppError, AppResult};

/// GET /metrics
pub async fn metrics_handler() -> AppResult<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| AppError::internal(format!("metrics encode: {e}")))?;
    String::from_utf8(buffer).map_err(|e| AppError::internal(format!("metrics encode: {e}")))
}
