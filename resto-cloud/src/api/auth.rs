//! Authentication endpoints: login, logout, password change

use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderName, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::UserRole;

use crate::auth::{ClientIp, SessionUser};
use crate::auth::policy::{self, SessionView};
use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;
use crate::util::{MIN_PASSWORD_LEN, hash_password, normalize_email, verify_password};

/// POST /api/auth/login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub role: UserRole,
    pub must_change_password: bool,
    /// Page the client should open next
    pub redirect_to: &'static str,
}

type SessionReply = ([(HeaderName, String); 1], Json<SessionResponse>);

/// Sign `user` in: fresh token in the body and in the session cookie.
fn session_response(state: &AppState, user: &SessionUser) -> Result<SessionReply, ServiceError> {
    let token = state
        .session_keys
        .issue(user)
        .map_err(|e| ServiceError::Db(e.into()))?;
    let cookie = state.session_keys.cookie(&token);

    let body = SessionResponse {
        token,
        role: user.role,
        must_change_password: user.must_change_password,
        redirect_to: policy::home_for(&SessionView::from_user(user)),
    };
    Ok(([(header::SET_COOKIE, cookie)], Json(body)))
}

pub async fn login(
    State(state): State<AppState>,
    ip: ClientIp,
    Json(req): Json<LoginRequest>,
) -> Result<SessionReply, ServiceError> {
    let email = normalize_email(&req.email);
    let user = db::users::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::InvalidCredentials))?;

    if !verify_password(&req.password, &user.hashed_password) {
        tracing::warn!(email = %email, ip = %ip.0, "Login failed: wrong password");
        return Err(AppError::new(ErrorCode::InvalidCredentials).into());
    }

    let role = UserRole::from_db(&user.role).ok_or_else(|| {
        ServiceError::Db(format!("user {} has unknown role {}", user.id, user.role).into())
    })?;

    let session = SessionUser {
        user_id: user.id,
        email: user.email,
        role,
        must_change_password: user.must_change_password,
    };

    let now = shared::util::now_millis();
    let _ = db::audit::log(
        &state.pool,
        &session.user_id,
        None,
        "login",
        None,
        ip.as_audit(),
        now,
    )
    .await;
    tracing::info!(user_id = %session.user_id, role = role.as_db(), "User logged in");

    session_response(&state, &session)
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, state.session_keys.clear_cookie())],
        Json(serde_json::json!({ "redirectTo": policy::LOGIN_PATH })),
    )
}

/// POST /api/auth/update-password
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub new_password: String,
    pub confirm_password: String,
}

pub fn check_new_password(new_password: &str, confirm_password: &str) -> Result<(), AppError> {
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::new(ErrorCode::PasswordTooShort));
    }
    if new_password != confirm_password {
        return Err(AppError::new(ErrorCode::PasswordMismatch));
    }
    Ok(())
}

pub async fn update_password(
    State(state): State<AppState>,
    ip: ClientIp,
    Extension(user): Extension<SessionUser>,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<SessionReply, ServiceError> {
    check_new_password(&req.new_password, &req.confirm_password)?;

    let hashed =
        hash_password(&req.new_password).map_err(|e| ServiceError::Db(e.to_string().into()))?;
    let now = shared::util::now_millis();
    if !db::users::set_password(&state.pool, &user.user_id, &hashed, false, now).await? {
        return Err(AppError::not_found("User").into());
    }

    let _ = db::audit::log(
        &state.pool,
        &user.user_id,
        None,
        "password_changed",
        None,
        ip.as_audit(),
        now,
    )
    .await;
    tracing::info!(user_id = %user.user_id, "Password changed");

    let session = SessionUser {
        must_change_password: false,
        ..user
    };
    session_response(&state, &session)
}
