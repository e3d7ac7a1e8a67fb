use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue, Method};
use tower_http::cors::CorsLayer;

use crate::{config::Config, middleware::csrf::CSRF_HEADER};

const DEV_ORIGIN: &str = "http://localhost:3000";

fn allowed_origin(config: &Config) -> &str {
    if config.is_development() {
        DEV_ORIGIN
    } else {
        &config.cors_origin
    }
}

/// Single-origin CORS with credentials. An origin that is not a valid
/// header value falls back to the development one.
pub fn cors_layer(config: &Config) -> CorsLayer {
    let origin = HeaderValue::from_str(allowed_origin(config)).unwrap_or_else(|_| {
        tracing::warn!(origin = %config.cors_origin, "invalid CORS origin, using {DEV_ORIGIN}");
        HeaderValue::from_static(DEV_ORIGIN)
    });

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
            HeaderName::from_static(CSRF_HEADER),
        ])
        .expose_headers([HeaderName::from_static("x-captcha-id")])
        .allow_credentials(true)
        .max_age(Duration::from_secs(300))
}
