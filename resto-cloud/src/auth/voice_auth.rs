//! Shared-secret authentication for the voice assistant
//!
//! The assistant presents `x-voice-secret` on every call. Comparison goes
//! through HMAC-SHA256 so it runs in constant time.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use shared::error::{AppError, ErrorCode};

pub const VOICE_SECRET_HEADER: &str = "x-voice-secret";

#[derive(Clone)]
pub struct VoiceSecret(Arc<str>);

impl VoiceSecret {
    pub fn new(secret: &str) -> Self {
        Self(Arc::from(secret))
    }

    fn tag(&self, value: &[u8]) -> Option<Hmac<Sha256>> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.0.as_bytes()).ok()?;
        mac.update(value);
        Some(mac)
    }

    pub fn matches(&self, presented: &str) -> bool {
        if self.0.is_empty() {
            return false;
        }
        let (Some(expected), Some(actual)) = (
            self.tag(self.0.as_bytes()),
            self.tag(presented.as_bytes()),
        ) else {
            return false;
        };
        actual
            .verify_slice(&expected.finalize().into_bytes())
            .is_ok()
    }
}

pub async fn voice_auth_middleware(
    State(secret): State<VoiceSecret>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = request
        .headers()
        .get(VOICE_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !secret.matches(presented) {
        tracing::warn!(path = %request.uri().path(), "Voice API secret rejected");
        return Err(AppError::new(ErrorCode::NotAuthenticated));
    }

    Ok(next.run(request).await)
}
