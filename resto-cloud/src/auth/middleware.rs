//! Session middleware
//!
//! Pages go through [`access_policy`] and are redirected. API routes use the
//! `require_*` guards and answer with an error body instead.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use shared::error::{AppError, ErrorCode};

use super::policy::{self, Action, SessionView};
use super::session::{SessionError, SessionGuard, SessionUser};

/// Page guard: evaluates the access policy for the request path.
///
/// An invalid, expired or revoked token counts as "not logged in".
pub async fn access_policy(
    State(guard): State<SessionGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match guard.current(request.headers()).await {
        Some(Ok(user)) => Some(user),
        Some(Err(e @ SessionError::Lookup(_))) => return AppError::from(e).into_response(),
        Some(Err(e)) => {
            tracing::debug!("Ignoring session on page request: {e}");
            None
        }
        None => None,
    };

    let view = user
        .as_ref()
        .map(SessionView::from_user)
        .unwrap_or_else(SessionView::anonymous);

    match policy::decide(&view, request.uri().path()) {
        Action::Continue => {
            if let Some(user) = user {
                request.extensions_mut().insert(user);
            }
            next.run(request).await
        }
        Action::RedirectTo(target) => Redirect::to(target).into_response(),
    }
}

async fn authenticate(guard: &SessionGuard, headers: &HeaderMap) -> Result<SessionUser, AppError> {
    match guard.current(headers).await {
        Some(result) => result.map_err(|e| {
            tracing::debug!("Session rejected: {e}");
            AppError::from(e)
        }),
        None => Err(AppError::new(ErrorCode::NotAuthenticated)),
    }
}

/// API guard: valid session whose password is up to date.
pub async fn require_session(
    State(guard): State<SessionGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&guard, request.headers()).await?;
    if user.must_change_password {
        return Err(AppError::new(ErrorCode::PasswordChangeRequired));
    }
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// API guard for the password change endpoint: any valid session.
pub async fn require_any_session(
    State(guard): State<SessionGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&guard, request.headers()).await?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Must run after [`require_session`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<SessionUser>()
        .ok_or_else(|| AppError::new(ErrorCode::NotAuthenticated))?;
    if !user.role.is_admin() {
        tracing::warn!(user_id = %user.user_id, "Admin route refused");
        return Err(AppError::new(ErrorCode::AdminRequired));
    }
    Ok(next.run(request).await)
}

/// Must run after [`require_session`].
pub async fn require_owner(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<SessionUser>()
        .ok_or_else(|| AppError::new(ErrorCode::NotAuthenticated))?;
    if user.role.is_admin() {
        return Err(AppError::new(ErrorCode::OwnerRequired));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::{AccountDirectory, SessionKeys};
    use crate::db::BoxError;
    use async_trait::async_trait;
    use axum::{Router, body::Body, middleware, routing::get};
    use http::{StatusCode, header};
    use shared::models::UserRole;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    /// In-memory accounts: user id -> must_change_password
    #[derive(Default)]
    struct Accounts {
        flags: Mutex<HashMap<String, bool>>,
        unreachable: bool,
    }

    impl Accounts {
        fn with(user_id: &str, must_change_password: bool) -> Arc<Self> {
            let accounts = Self::default();
            accounts
                .flags
                .lock()
                .unwrap()
                .insert(user_id.into(), must_change_password);
            Arc::new(accounts)
        }

        fn set(&self, user_id: &str, must_change_password: bool) {
            self.flags
                .lock()
                .unwrap()
                .insert(user_id.into(), must_change_password);
        }
    }

    #[async_trait]
    impl AccountDirectory for Accounts {
        async fn must_change_password(&self, user_id: &str) -> Result<Option<bool>, BoxError> {
            if self.unreachable {
                return Err("connection refused".into());
            }
            Ok(self.flags.lock().unwrap().get(user_id).copied())
        }
    }

    fn keys() -> SessionKeys {
        SessionKeys::new("test-secret", false)
    }

    fn guard_with(accounts: Arc<Accounts>) -> SessionGuard {
        SessionGuard::new(keys(), accounts)
    }

    fn token(role: UserRole, mcp: bool) -> String {
        keys()
            .issue(&SessionUser {
                user_id: "u-1".into(),
                email: "someone@resto.fr".into(),
                role,
                must_change_password: mcp,
            })
            .unwrap()
    }

    async fn whoami(request: Request) -> String {
        request
            .extensions()
            .get::<SessionUser>()
            .map(|u| u.email.clone())
            .unwrap_or_default()
    }

    fn pages() -> Router {
        pages_with(Accounts::with("u-1", false))
    }

    fn pages_with(accounts: Arc<Accounts>) -> Router {
        Router::new()
            .route("/login", get(whoami))
            .route("/update-password", get(whoami))
            .route("/admin", get(whoami))
            .route("/dashboard", get(whoami))
            .layer(middleware::from_fn_with_state(
                guard_with(accounts),
                access_policy,
            ))
    }

    fn api() -> Router {
        api_with(Accounts::with("u-1", false))
    }

    fn api_with(accounts: Arc<Accounts>) -> Router {
        let admin = Router::new()
            .route("/api/admin/ping", get(whoami))
            .layer(middleware::from_fn(require_admin));
        let owner = Router::new()
            .route("/api/dashboard/ping", get(whoami))
            .layer(middleware::from_fn(require_owner));
        admin
            .merge(owner)
            .layer(middleware::from_fn_with_state(
                guard_with(accounts),
                require_session,
            ))
    }

    fn get_req(path: &str, token: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri(path);
        if let Some(t) = token {
            builder = builder.header(header::COOKIE, format!("session={t}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_anonymous_page_redirects_to_login() {
        let resp = pages().oneshot(get_req("/dashboard", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn test_garbage_cookie_is_anonymous() {
        let resp = pages()
            .oneshot(get_req("/admin", Some("not-a-jwt")))
            .await
            .unwrap();
        assert_eq!(resp.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn test_pending_password_change_redirects() {
        let t = token(UserRole::Owner, true);
        let app = pages_with(Accounts::with("u-1", true));
        let resp = app
            .clone()
            .oneshot(get_req("/dashboard", Some(&t)))
            .await
            .unwrap();
        assert_eq!(resp.headers()[header::LOCATION], "/update-password");

        let resp = app
            .oneshot(get_req("/update-password", Some(&t)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_on_login_goes_to_admin() {
        let t = token(UserRole::Admin, false);
        let resp = pages().oneshot(get_req("/login", Some(&t))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/admin");
    }

    #[tokio::test]
    async fn test_continue_exposes_session_user() {
        let t = token(UserRole::Owner, false);
        let resp = pages().oneshot(get_req("/dashboard", Some(&t))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"someone@resto.fr");
    }

    #[tokio::test]
    async fn test_api_requires_session() {
        let resp = api().oneshot(get_req("/api/admin/ping", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_api_blocks_pending_password_change() {
        let t = token(UserRole::Admin, true);
        let resp = api_with(Accounts::with("u-1", true))
            .oneshot(get_req("/api/admin/ping", Some(&t)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_api_role_guards() {
        let admin = token(UserRole::Admin, false);
        let owner = token(UserRole::Owner, false);

        let resp = api()
            .oneshot(get_req("/api/admin/ping", Some(&admin)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = api()
            .oneshot(get_req("/api/admin/ping", Some(&owner)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = api()
            .oneshot(get_req("/api/dashboard/ping", Some(&admin)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = api()
            .oneshot(get_req("/api/dashboard/ping", Some(&owner)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_password_reset_applies_to_issued_session() {
        let accounts = Accounts::with("u-1", false);
        let t = token(UserRole::Owner, false);

        let resp = pages_with(accounts.clone())
            .oneshot(get_req("/dashboard", Some(&t)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        // administrator resets the password; the token still says mcp=false
        accounts.set("u-1", true);

        let resp = pages_with(accounts.clone())
            .oneshot(get_req("/dashboard", Some(&t)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/update-password");

        let resp = api_with(accounts)
            .oneshot(get_req("/api/dashboard/ping", Some(&t)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_completed_change_clears_stale_flag() {
        let t = token(UserRole::Owner, true);
        let resp = pages_with(Accounts::with("u-1", false))
            .oneshot(get_req("/dashboard", Some(&t)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_deleted_account_is_logged_out() {
        let t = token(UserRole::Owner, false);
        let accounts = Arc::new(Accounts::default());

        let resp = pages_with(accounts.clone())
            .oneshot(get_req("/dashboard", Some(&t)))
            .await
            .unwrap();
        assert_eq!(resp.headers()[header::LOCATION], "/login");

        let resp = api_with(accounts)
            .oneshot(get_req("/api/dashboard/ping", Some(&t)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_account_store_failure_is_internal_error() {
        let t = token(UserRole::Owner, false);
        let accounts = Arc::new(Accounts {
            unreachable: true,
            ..Default::default()
        });

        let resp = pages_with(accounts.clone())
            .oneshot(get_req("/dashboard", Some(&t)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = api_with(accounts)
            .oneshot(get_req("/api/dashboard/ping", Some(&t)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        // no token: nothing to look up
        let resp = pages_with(Arc::new(Accounts {
            unreachable: true,
            ..Default::default()
        }))
        .oneshot(get_req("/login", None))
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
