use std::net::SocketAddr;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blueink_api::{
    config::Config,
    db, routes,
    services::maintenance::{self, PURGE_INTERVAL},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    if let Some(admin_email) = config.admin_email.as_deref() {
        if db::bootstrap_admin(&pool, admin_email).await? {
            info!(email = %admin_email, "admin role granted");
        }
    }

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config, pool);

    if state.email.is_some() {
        info!("SMTP email service configured");
    } else {
        warn!("SMTP not configured, password reset is disabled");
    }
    if state.oauth.is_none() {
        info!("Google OAuth not configured");
    }

    maintenance::start(
        state.captcha.clone(),
        vec![state.auth_limiter.clone(), state.api_limiter.clone()],
        PURGE_INTERVAL,
    );

    let app = routes::router(state);

    info!("blueink API listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
