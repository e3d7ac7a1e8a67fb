use std::{collections::HashMap, net::IpAddr, sync::Arc, time::Duration};

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::{sync::Mutex, time::Instant};

use crate::{
    config::RateLimitSetting, error::AppError, middleware::client_ip::client_ip,
    services::metrics::RATE_LIMITED_COUNTER,
};

struct Window {
    started: Instant,
    count: u32,
}

struct Inner {
    name: &'static str,
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

/// Fixed-window request counter keyed by client IP.
///
/// Once `max_requests` is reached every further request from that IP is
/// refused until its window rolls over.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

impl RateLimiter {
    pub fn new(name: &'static str, setting: RateLimitSetting) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                max_requests: setting.max_requests,
                window: Duration::from_secs(setting.window_seconds),
                windows: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Counts one request. `Err` carries how long until the window rolls.
    pub async fn check(&self, ip: IpAddr) -> Result<(), Duration> {
        let now = Instant::now();
        let mut windows = self.inner.windows.lock().await;
        let window = windows.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(window.started) >= self.inner.window {
            window.started = now;
            window.count = 0;
        }

        if window.count >= self.inner.max_requests {
            return Err(self.inner.window - now.duration_since(window.started));
        }
        window.count += 1;
        Ok(())
    }

    /// Forget IPs whose window has rolled over. Returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.inner.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, w| now.duration_since(w.started) < self.inner.window);
        before - windows.len()
    }
}

#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: RateLimiter,
    pub trust_proxy_headers: bool,
}

pub async fn rate_limit(State(state): State<RateLimitState>, req: Request, next: Next) -> Response {
    let ip = client_ip(&req, state.trust_proxy_headers);

    if let Err(retry_after) = state.limiter.check(ip).await {
        RATE_LIMITED_COUNTER.with_label_values(&[state.limiter.name()]).inc();
        tracing::warn!(
            client_ip = %ip,
            limiter = state.limiter.name(),
            path = %req.uri().path(),
            "rate limit exceeded"
        );

        let mut response = AppError::TooManyRequests.into_response();
        // Round up so clients never retry a moment too early.
        let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
        return response;
    }

    next.run(req).await
}
