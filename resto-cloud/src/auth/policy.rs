//! Page access policy
//!
//! Decides, from the session and the requested path alone, whether a page
//! request is served or redirected. Rules are evaluated in order and the
//! first match wins.

use shared::models::UserRole;

use super::session::SessionUser;

pub const LOGIN_PATH: &str = "/login";
pub const UPDATE_PASSWORD_PATH: &str = "/update-password";
pub const ADMIN_PATH: &str = "/admin";
pub const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Admin,
    Dashboard,
    UpdatePassword,
    Login,
    Other,
}

impl RouteKind {
    pub fn classify(path: &str) -> Self {
        if path.starts_with(ADMIN_PATH) {
            Self::Admin
        } else if path.starts_with(DASHBOARD_PATH) {
            Self::Dashboard
        } else if path == UPDATE_PASSWORD_PATH {
            Self::UpdatePassword
        } else if path == LOGIN_PATH {
            Self::Login
        } else {
            Self::Other
        }
    }

    fn is_protected(&self) -> bool {
        matches!(self, Self::Admin | Self::Dashboard)
    }
}

/// What the policy knows about the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionView {
    pub is_logged_in: bool,
    pub role: Option<UserRole>,
    pub must_change_password: bool,
}

impl SessionView {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn from_user(user: &SessionUser) -> Self {
        Self {
            is_logged_in: true,
            role: Some(user.role),
            must_change_password: user.must_change_password,
        }
    }

    fn is_admin(&self) -> bool {
        self.role.is_some_and(|r| r.is_admin())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    RedirectTo(&'static str),
}

/// Where the caller lands after signing in.
pub fn home_for(session: &SessionView) -> &'static str {
    if session.must_change_password {
        UPDATE_PASSWORD_PATH
    } else if session.is_admin() {
        ADMIN_PATH
    } else {
        DASHBOARD_PATH
    }
}

pub fn decide(session: &SessionView, path: &str) -> Action {
    let route = RouteKind::classify(path);
    let logged_in = session.is_logged_in;

    // 1. pending password change
    if logged_in && session.must_change_password && route != RouteKind::UpdatePassword {
        return Action::RedirectTo(UPDATE_PASSWORD_PATH);
    }

    // 2. already signed in
    if route == RouteKind::Login && logged_in {
        return Action::RedirectTo(home_for(session));
    }

    // 3.
    if route.is_protected() && !logged_in {
        return Action::RedirectTo(LOGIN_PATH);
    }

    // 4. unreachable while rule 1 runs first, see test_rule_four_is_shadowed
    if route.is_protected() && logged_in && session.must_change_password {
        return Action::RedirectTo(UPDATE_PASSWORD_PATH);
    }

    // 5.
    if route == RouteKind::Admin && logged_in && !session.is_admin() {
        return Action::RedirectTo(DASHBOARD_PATH);
    }

    // 6.
    if route == RouteKind::Dashboard && logged_in && session.is_admin() {
        return Action::RedirectTo(ADMIN_PATH);
    }

    Action::Continue
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATHS: &[&str] = &[
        "/",
        "/login",
        "/update-password",
        "/admin",
        "/admin/restaurants/r-1",
        "/dashboard",
        "/dashboard/menu",
        "/pricing",
    ];

    fn session(role: UserRole, mcp: bool) -> SessionView {
        SessionView {
            is_logged_in: true,
            role: Some(role),
            must_change_password: mcp,
        }
    }

    fn all_sessions() -> Vec<SessionView> {
        let mut out = vec![SessionView::anonymous()];
        for role in [UserRole::Admin, UserRole::Owner] {
            for mcp in [false, true] {
                out.push(session(role, mcp));
            }
        }
        out
    }

    #[test]
    fn test_classify() {
        assert_eq!(RouteKind::classify("/admin"), RouteKind::Admin);
        assert_eq!(RouteKind::classify("/administration"), RouteKind::Admin);
        assert_eq!(RouteKind::classify("/dashboard/hours"), RouteKind::Dashboard);
        assert_eq!(RouteKind::classify("/update-password"), RouteKind::UpdatePassword);
        assert_eq!(RouteKind::classify("/login"), RouteKind::Login);
        assert_eq!(RouteKind::classify("/login/help"), RouteKind::Other);
        assert_eq!(RouteKind::classify("/"), RouteKind::Other);
    }

    #[test]
    fn test_pending_password_change_redirects_everywhere_else() {
        for role in [UserRole::Admin, UserRole::Owner] {
            let s = session(role, true);
            for path in PATHS.iter().filter(|p| **p != UPDATE_PASSWORD_PATH) {
                assert_eq!(
                    decide(&s, path),
                    Action::RedirectTo(UPDATE_PASSWORD_PATH),
                    "{role:?} on {path}"
                );
            }
            assert_eq!(decide(&s, UPDATE_PASSWORD_PATH), Action::Continue);
        }
    }

    #[test]
    fn test_anonymous_sent_to_login_from_protected_pages() {
        let anon = SessionView::anonymous();
        for path in ["/admin", "/admin/x", "/dashboard", "/dashboard/menu"] {
            assert_eq!(decide(&anon, path), Action::RedirectTo(LOGIN_PATH));
        }
        for path in ["/", "/login", "/update-password", "/pricing"] {
            assert_eq!(decide(&anon, path), Action::Continue);
        }
    }

    #[test]
    fn test_login_page_sends_signed_in_users_home() {
        assert_eq!(
            decide(&session(UserRole::Admin, false), "/login"),
            Action::RedirectTo(ADMIN_PATH)
        );
        assert_eq!(
            decide(&session(UserRole::Owner, false), "/login"),
            Action::RedirectTo(DASHBOARD_PATH)
        );
    }

    #[test]
    fn test_role_separation() {
        let admin = session(UserRole::Admin, false);
        let owner = session(UserRole::Owner, false);

        assert_eq!(decide(&admin, "/admin/restaurants"), Action::Continue);
        assert_eq!(decide(&admin, "/dashboard"), Action::RedirectTo(ADMIN_PATH));
        assert_eq!(decide(&owner, "/dashboard/menu"), Action::Continue);
        assert_eq!(decide(&owner, "/admin"), Action::RedirectTo(DASHBOARD_PATH));
    }

    #[test]
    fn test_signed_in_users_may_view_update_password() {
        for s in all_sessions() {
            assert_eq!(decide(&s, UPDATE_PASSWORD_PATH), Action::Continue);
        }
    }

    #[test]
    fn test_rule_four_is_shadowed() {
        // Every session that would reach rule 4 was already redirected by rule 1
        // with the same target.
        for s in all_sessions().into_iter().filter(|s| s.must_change_password) {
            for path in ["/admin", "/dashboard"] {
                assert_eq!(decide(&s, path), Action::RedirectTo(UPDATE_PASSWORD_PATH));
            }
        }
    }

    #[test]
    fn test_decision_is_idempotent() {
        for s in all_sessions() {
            for path in PATHS {
                assert_eq!(decide(&s, path), decide(&s, path));
            }
        }
    }

    #[test]
    fn test_redirect_targets_are_stable() {
        // Following a redirect never leads to another redirect.
        for s in all_sessions() {
            for path in PATHS {
                if let Action::RedirectTo(target) = decide(&s, path) {
                    assert_eq!(decide(&s, target), Action::Continue, "{s:?} {path} -> {target}");
                }
            }
        }
    }

    #[test]
    fn test_home_for() {
        assert_eq!(home_for(&session(UserRole::Admin, true)), UPDATE_PASSWORD_PATH);
        assert_eq!(home_for(&session(UserRole::Admin, false)), ADMIN_PATH);
        assert_eq!(home_for(&session(UserRole::Owner, false)), DASHBOARD_PATH);
    }
}
