pub mod audit_log;
pub mod auth;
pub mod captcha;
pub mod extract;
pub mod health;
pub mod metrics;
pub mod oauth;
pub mod profiles;
pub mod roles;
pub mod users;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    middleware::{
        access::{admin_only, owner_or_admin},
        audit::{audit, AuditState},
        auth::auth_required,
        cors::cors_layer,
        csrf::csrf_protect,
        ip_filter::{ip_filter, IpFilter, IpFilterState},
        rate_limit::{rate_limit, RateLimitState, RateLimiter},
    },
    routes::extract::Json,
    services::profiles::MEDIA_URL_PREFIX,
    AppState,
};

/// Avatar uploads are the largest bodies we accept.
const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Success envelope shared by every JSON endpoint.
pub fn ok<T: Serialize>(message: &str, data: T) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": message,
        "data": data,
    }))
}

/// Builds the whole HTTP surface.
///
/// Global layers, outermost first: trace, CORS, IP filter, CSRF. Each API
/// group then stacks its rate limiter, authentication, audit wrapper and
/// per-route access gate.
pub fn router(state: AppState) -> Router {
    let trust_proxy_headers = state.config.trust_proxy_headers;
    let limit = |limiter: &RateLimiter| {
        from_fn_with_state(
            RateLimitState {
                limiter: limiter.clone(),
                trust_proxy_headers,
            },
            rate_limit,
        )
    };
    let admin = || from_fn_with_state(state.roles.clone(), admin_only);
    let owner = || from_fn_with_state(state.roles.clone(), owner_or_admin);

    let public = Router::new()
        .route("/", get(health::service_info))
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/api/v1/captcha", get(captcha::generate_captcha))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/oauth/google/login", get(oauth::google_login))
        .route("/api/v1/oauth/google/callback", get(oauth::google_callback));

    let credentials = Router::new()
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/forgot-password", post(auth::forgot_password))
        .route("/api/v1/auth/reset-password", post(auth::reset_password))
        .layer(limit(&state.auth_limiter));

    let protected = Router::new()
        // Users
        .route(
            "/api/v1/users",
            get(users::list_users).merge(post(users::create_user).route_layer(admin())),
        )
        .route(
            "/api/v1/users/{id}",
            get(users::get_user).merge(
                put(users::update_user)
                    .delete(users::delete_user)
                    .route_layer(owner()),
            ),
        )
        // Roles
        .route(
            "/api/v1/roles",
            get(roles::list_roles)
                .post(roles::create_role)
                .route_layer(admin()),
        )
        .route(
            "/api/v1/roles/{id}",
            get(roles::get_role)
                .delete(roles::delete_role)
                .route_layer(admin()),
        )
        .route("/api/v1/role", get(roles::my_roles))
        .route(
            "/api/v1/users/{id}/roles",
            get(roles::user_roles)
                .post(roles::assign_user_role)
                .route_layer(admin()),
        )
        .route(
            "/api/v1/users/{id}/role",
            put(roles::replace_user_role).route_layer(admin()),
        )
        .route(
            "/api/v1/users/{id}/roles/{role_id}",
            delete(roles::revoke_user_role).route_layer(admin()),
        )
        // Profiles
        .route("/api/v1/profiles", get(profiles::list_profiles))
        .route(
            "/api/v1/profiles/{id}",
            get(profiles::get_profile).route_layer(admin()),
        )
        .route("/api/v1/profile", get(profiles::my_profile))
        .route(
            "/api/v1/users/{id}/profile",
            get(profiles::get_user_profile).merge(
                post(profiles::create_user_profile)
                    .put(profiles::update_user_profile)
                    .delete(profiles::delete_user_profile)
                    .route_layer(owner()),
            ),
        )
        .route(
            "/api/v1/admin/profile/{id}",
            get(profiles::get_profile).route_layer(admin()),
        )
        // Audit
        .route(
            "/api/v1/audit-logs",
            get(audit_log::list_audit_logs).route_layer(admin()),
        )
        .layer(from_fn_with_state(
            AuditState {
                recorder: state.audit.clone(),
                trust_proxy_headers,
            },
            audit,
        ))
        .layer(from_fn_with_state(state.tokens.clone(), auth_required))
        .layer(limit(&state.api_limiter));

    let ip_state = IpFilterState {
        filter: Arc::new(IpFilter::from_config(&state.config)),
        trust_proxy_headers,
    };

    Router::new()
        .merge(public)
        .merge(credentials)
        .merge(protected)
        .nest_service(MEDIA_URL_PREFIX, ServeDir::new(&state.config.media_dir))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(from_fn(csrf_protect))
        .layer(from_fn_with_state(ip_state, ip_filter))
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
