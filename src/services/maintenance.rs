use std::{sync::Arc, time::Duration};

use tracing::debug;

use crate::{middleware::rate_limit::RateLimiter, services::captcha::CaptchaStore};

pub const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Spawn a background task that drops expired captcha challenges and
/// rolled-over rate-limit windows every `interval`.
pub fn start(captcha: Arc<CaptchaStore>, limiters: Vec<RateLimiter>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let challenges = captcha.purge_expired();
            for limiter in &limiters {
                let windows = limiter.purge_expired().await;
                if windows > 0 {
                    debug!(limiter = limiter.name(), windows, "purged rate-limit windows");
                }
            }
            if challenges > 0 {
                debug!(challenges, "purged expired captchas");
            }
        }
    });
}
