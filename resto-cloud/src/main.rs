//! resto-cloud — restaurant ordering back office
//!
//! Long-running service that:
//! - Serves the admin back-office and owner dashboard behind session auth
//! - Keeps kitchen status, wait-time policies and business hours per restaurant
//! - Assembles menus into pricing JSON and voice-assistant system prompts

mod api;
mod auth;
mod config;
mod db;
mod email;
mod error;
mod services;
mod state;
mod util;

use std::net::SocketAddr;

use config::Config;
use shared::models::UserRole;
use state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resto_cloud=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting resto-cloud (env: {})", config.environment);

    let state = AppState::new(&config).await?;

    bootstrap_admin(&state, &config).await?;

    // Periodic rate limiter cleanup (every 5 minutes)
    let rate_limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rate_limiter.cleanup().await;
        }
    });

    let app = api::create_router(state);

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("resto-cloud HTTP listening on {http_addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Create the configured administrator account if it does not exist yet.
async fn bootstrap_admin(state: &AppState, config: &Config) -> Result<(), BoxError> {
    let (Some(email), Some(password)) = (
        config.bootstrap_admin_email.as_deref(),
        config.bootstrap_admin_password.as_deref(),
    ) else {
        return Ok(());
    };

    let email = util::normalize_email(email);
    if db::users::find_by_email(&state.pool, &email).await?.is_some() {
        return Ok(());
    }

    if password.chars().count() < util::MIN_PASSWORD_LEN {
        return Err(format!(
            "BOOTSTRAP_ADMIN_PASSWORD must be at least {} characters",
            util::MIN_PASSWORD_LEN
        )
        .into());
    }

    let hashed = util::hash_password(password).map_err(|e| e.to_string())?;
    let id = uuid::Uuid::new_v4().to_string();
    db::users::create(
        &state.pool,
        &db::users::NewUser {
            id: &id,
            email: &email,
            hashed_password: &hashed,
            name: None,
            role: UserRole::Admin,
            must_change_password: false,
        },
        shared::util::now_millis(),
    )
    .await?;

    tracing::info!(email = %email, "Bootstrap administrator created");
    Ok(())
}
