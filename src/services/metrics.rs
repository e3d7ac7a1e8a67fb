use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_int_counter, CounterVec, IntCounter};

lazy_static! {
    // ── Security events ─────────────────────────────────────────────────────
    pub static ref AUTH_ATTEMPTS_COUNTER: CounterVec = register_counter_vec!(
        "api_auth_attempts_total",
        "Authentication attempts by flow and outcome",
        &["flow", "outcome"]
    ).unwrap();

    pub static ref RATE_LIMITED_COUNTER: CounterVec = register_counter_vec!(
        "api_rate_limited_total",
        "Requests rejected by a rate limiter",
        &["limiter"]
    ).unwrap();

    pub static ref CSRF_REJECTED_COUNTER: IntCounter = register_int_counter!(
        "api_csrf_rejected_total",
        "Mutating requests rejected for a missing or mismatched CSRF token"
    ).unwrap();

    pub static ref IP_BLOCKED_COUNTER: IntCounter = register_int_counter!(
        "api_ip_blocked_total",
        "Requests refused by the IP filter"
    ).unwrap();

    // ── Background work ─────────────────────────────────────────────────────
    pub static ref AUDIT_WRITE_FAILURES_COUNTER: IntCounter = register_int_counter!(
        "api_audit_write_failures_total",
        "Audit entries that could not be persisted"
    ).unwrap();
}

/// Records one pass through a login-like flow.
pub fn auth_attempt(flow: &str, outcome: &str) {
    AUTH_ATTEMPTS_COUNTER.with_label_values(&[flow, outcome]).inc();
}
