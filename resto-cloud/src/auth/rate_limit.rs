//! Login throttling: fixed window of attempts per client address

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::error::{AppError, ErrorCode};
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::client_ip;

const LOGIN_MAX_ATTEMPTS: u32 = 5;
const LOGIN_WINDOW: Duration = Duration::from_secs(60);

struct Window {
    attempts: u32,
    started: Instant,
}

/// Attempts per client address, shared by every clone
#[derive(Clone)]
pub struct RateLimiter {
    max_attempts: u32,
    window: Duration,
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            windows: Arc::default(),
        }
    }

    pub fn for_login() -> Self {
        Self::new(LOGIN_MAX_ATTEMPTS, LOGIN_WINDOW)
    }

    /// Count one attempt from `ip`; `false` once the window is used up.
    async fn allow(&self, ip: &str) -> bool {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();
        let window = windows.entry(ip.to_owned()).or_insert(Window {
            attempts: 0,
            started: now,
        });

        if now.duration_since(window.started) >= self.window {
            window.attempts = 0;
            window.started = now;
        }

        window.attempts += 1;
        window.attempts <= self.max_attempts
    }

    /// Forget clients whose window has run out
    pub async fn cleanup(&self) {
        let now = Instant::now();
        self.windows
            .lock()
            .await
            .retain(|_, w| now.duration_since(w.started) < self.window);
    }
}

/// Middleware for `POST /api/auth/login`
pub async fn login_rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let ip = client_ip::resolve(request.headers(), request.extensions());
    if !limiter.allow(&ip).await {
        tracing::warn!(ip = %ip, "Login rate limit exceeded");
        return Err(AppError::new(ErrorCode::TooManyRequests).into_response());
    }
    Ok(next.run(request).await)
}
