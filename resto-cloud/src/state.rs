//! Application state

use std::sync::Arc;

use aws_sdk_sesv2::Client as SesClient;
use axum::extract::FromRef;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::auth::{RateLimiter, SessionGuard, SessionKeys, VoiceSecret};
use crate::config::Config;
use crate::email::EmailClient;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Session token signing and cookie settings
    pub session_keys: SessionKeys,
    /// Session verification against the current account state
    pub session_guard: SessionGuard,
    /// Secret expected from the voice assistant
    pub voice_secret: VoiceSecret,
    /// Transactional email
    pub email: EmailClient,
    /// Transfer number for restaurants without a phone
    pub default_transfer_phone: String,
    /// Rate limiter for the login route
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let ses = if let Some(region) = &config.ses_region {
            let ses_config = aws_config
                .to_builder()
                .region(aws_config::Region::new(region.clone()))
                .build();
            SesClient::new(&ses_config)
        } else {
            SesClient::new(&aws_config)
        };

        let session_keys = SessionKeys::new(&config.jwt_secret, !config.is_development());
        let session_guard = SessionGuard::new(session_keys.clone(), Arc::new(pool.clone()));

        Ok(Self {
            pool,
            session_keys,
            session_guard,
            voice_secret: VoiceSecret::new(&config.voice_api_secret),
            email: EmailClient::new(
                ses,
                config.ses_from_email.clone(),
                config.public_base_url.clone(),
            ),
            default_transfer_phone: config.default_transfer_phone.clone(),
            rate_limiter: RateLimiter::for_login(),
        })
    }
}

impl FromRef<AppState> for SessionGuard {
    fn from_ref(state: &AppState) -> Self {
        state.session_guard.clone()
    }
}

impl FromRef<AppState> for RateLimiter {
    fn from_ref(state: &AppState) -> Self {
        state.rate_limiter.clone()
    }
}

impl FromRef<AppState> for VoiceSecret {
    fn from_ref(state: &AppState) -> Self {
        state.voice_secret.clone()
    }
}
