//! Session tokens
//!
//! A session is a signed HS256 JWT, carried in the `session` cookie or an
//! `Authorization: Bearer` header. Every request decodes the token again and
//! refreshes the forced-password-change flag from the account store, so an
//! administrator's password reset applies to sessions already issued.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::UserRole;

use crate::db::BoxError;

pub const SESSION_COOKIE: &str = "session";

const SESSION_EXPIRY_HOURS: i64 = 24;

/// JWT claims for a logged-in user
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    /// Password change pending
    pub mcp: bool,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated user, inserted into request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: String,
    pub email: String,
    pub role: UserRole,
    pub must_change_password: bool,
}

impl From<SessionClaims> for SessionUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
            must_change_password: claims.mcp,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session expired")]
    Expired,
    #[error("invalid session token: {0}")]
    Invalid(String),
    #[error("account {0} no longer exists")]
    Revoked(String),
    #[error("account lookup failed: {0}")]
    Lookup(BoxError),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Expired => AppError::new(ErrorCode::TokenExpired),
            SessionError::Invalid(_) | SessionError::Revoked(_) => {
                AppError::new(ErrorCode::TokenInvalid)
            }
            SessionError::Lookup(e) => {
                tracing::error!(error = %e, "Session account lookup failed");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

/// Signing material and cookie attributes
#[derive(Clone)]
pub struct SessionKeys {
    secret: Arc<str>,
    secure_cookie: bool,
}

impl SessionKeys {
    pub fn new(secret: &str, secure_cookie: bool) -> Self {
        Self {
            secret: Arc::from(secret),
            secure_cookie,
        }
    }

    /// Sign a fresh session for `user`
    pub fn issue(&self, user: &SessionUser) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now();
        let claims = SessionClaims {
            sub: user.user_id.clone(),
            email: user.email.clone(),
            role: user.role,
            mcp: user.must_change_password,
            exp: (now + chrono::Duration::hours(SESSION_EXPIRY_HOURS)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    pub fn verify(&self, token: &str) -> Result<SessionUser, SessionError> {
        let data = jsonwebtoken::decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => SessionError::Expired,
            _ => SessionError::Invalid(e.to_string()),
        })?;

        Ok(data.claims.into())
    }

    /// Decode the session carried by a request, if any.
    pub fn from_headers(&self, headers: &HeaderMap) -> Option<Result<SessionUser, SessionError>> {
        token_from_headers(headers).map(|token| self.verify(token))
    }

    /// `Set-Cookie` value carrying `token`
    pub fn cookie(&self, token: &str) -> String {
        let max_age = SESSION_EXPIRY_HOURS * 3600;
        let mut cookie =
            format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age}");
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value that removes the session
    pub fn clear_cookie(&self) -> String {
        let mut cookie = format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0");
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Source of the account flags a token may be stale about
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Current forced-change flag, `None` when the account is gone.
    async fn must_change_password(&self, user_id: &str) -> Result<Option<bool>, BoxError>;
}

/// Token verification plus the account refresh, shared by all session guards
#[derive(Clone)]
pub struct SessionGuard {
    keys: SessionKeys,
    accounts: Arc<dyn AccountDirectory>,
}

impl SessionGuard {
    pub fn new(keys: SessionKeys, accounts: Arc<dyn AccountDirectory>) -> Self {
        Self { keys, accounts }
    }

    /// Session carried by a request, if any, as the account stands now.
    pub async fn current(&self, headers: &HeaderMap) -> Option<Result<SessionUser, SessionError>> {
        let user = match self.keys.from_headers(headers)? {
            Ok(user) => user,
            Err(e) => return Some(Err(e)),
        };
        Some(self.refresh(user).await)
    }

    async fn refresh(&self, mut user: SessionUser) -> Result<SessionUser, SessionError> {
        match self.accounts.must_change_password(&user.user_id).await {
            Ok(Some(must_change_password)) => {
                user.must_change_password = must_change_password;
                Ok(user)
            }
            Ok(None) => Err(SessionError::Revoked(user.user_id)),
            Err(e) => Err(SessionError::Lookup(e)),
        }
    }
}

/// Bearer header first, then the session cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        && !token.is_empty()
    {
        return Some(token);
    }

    headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn owner() -> SessionUser {
        SessionUser {
            user_id: "u-1".into(),
            email: "chef@bistro.fr".into(),
            role: UserRole::Owner,
            must_change_password: true,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let keys = SessionKeys::new("secret", false);
        let token = keys.issue(&owner()).unwrap();
        assert_eq!(keys.verify(&token).unwrap(), owner());
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = SessionKeys::new("secret", false).issue(&owner()).unwrap();
        let err = SessionKeys::new("other", false).verify(&token).unwrap_err();
        assert!(matches!(err, SessionError::Invalid(_)));
    }

    #[test]
    fn test_expired_token() {
        let past = (chrono::Utc::now() - chrono::Duration::hours(2)).timestamp() as usize;
        let claims = SessionClaims {
            sub: "u-1".into(),
            email: "chef@bistro.fr".into(),
            role: UserRole::Owner,
            mcp: false,
            exp: past,
            iat: past - 60,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let err = SessionKeys::new("secret", false).verify(&token).unwrap_err();
        assert!(matches!(err, SessionError::Expired));
        assert_eq!(AppError::from(err).code, ErrorCode::TokenExpired);
    }

    #[test]
    fn test_session_errors_map_to_codes() {
        let revoked = AppError::from(SessionError::Revoked("u-1".into()));
        assert_eq!(revoked.code, ErrorCode::TokenInvalid);

        let lookup = AppError::from(SessionError::Lookup("pool timed out".into()));
        assert_eq!(lookup.code, ErrorCode::InternalError);
        assert!(!lookup.message.contains("pool"));
    }

    #[test]
    fn test_token_from_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def"),
        );
        headers.insert(
            http::header::COOKIE,
            HeaderValue::from_static("session=zzz"),
        );
        assert_eq!(token_from_headers(&headers), Some("abc.def"));
    }

    #[test]
    fn test_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::COOKIE,
            HeaderValue::from_static("theme=dark; session=abc.def; lang=fr"),
        );
        assert_eq!(token_from_headers(&headers), Some("abc.def"));

        let mut empty = HeaderMap::new();
        empty.insert(http::header::COOKIE, HeaderValue::from_static("session="));
        assert_eq!(token_from_headers(&empty), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let dev = SessionKeys::new("s", false);
        assert!(dev.cookie("t").starts_with("session=t; HttpOnly; SameSite=Lax; Path=/"));
        assert!(!dev.cookie("t").contains("Secure"));

        let prod = SessionKeys::new("s", true);
        assert!(prod.cookie("t").ends_with("; Secure"));
        assert!(prod.clear_cookie().contains("Max-Age=0"));
    }
}
