//! HTTP routes for resto-cloud

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod pages;
pub mod voice;

use axum::routing::{get, patch, post};
use axum::{Router, middleware};
use tower_http::trace::TraceLayer;

use crate::auth::middleware::{
    access_policy, require_admin, require_any_session, require_owner, require_session,
};
use crate::auth::rate_limit::login_rate_limit;
use crate::auth::voice_auth::voice_auth_middleware;
use crate::error::ServiceError;
use crate::state::AppState;

pub type ApiResult<T> = Result<axum::Json<T>, ServiceError>;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Pages: redirected by the access policy
    let pages = Router::new()
        .route("/login", get(pages::login_page))
        .route("/update-password", get(pages::update_password_page))
        .route("/admin", get(pages::admin_page))
        .route("/admin/restaurants/{id}", get(pages::admin_restaurant_page))
        .route("/dashboard", get(pages::dashboard_page))
        .layer(middleware::from_fn_with_state(state.clone(), access_policy));

    // Public auth (login is rate limited)
    let login = Router::new()
        .route("/api/auth/login", post(auth::login))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            login_rate_limit,
        ));

    let password = Router::new()
        .route("/api/auth/update-password", post(auth::update_password))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_any_session,
        ));

    let admin_api = Router::new()
        .route(
            "/api/admin/restaurants",
            get(admin::list_restaurants).post(admin::create_restaurant),
        )
        .route("/api/admin/restaurants/{id}", get(admin::get_restaurant))
        .route(
            "/api/admin/restaurants/{id}/status",
            patch(admin::update_status),
        )
        .route(
            "/api/admin/restaurants/{id}/reset-owner-password",
            post(admin::reset_owner_password),
        )
        .route(
            "/api/admin/restaurants/{id}/system-prompt",
            get(admin::get_system_prompt),
        )
        .route(
            "/api/admin/restaurants/{id}/menu-json",
            get(admin::get_menu_json),
        )
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let owner_api = Router::new()
        .route("/api/dashboard/restaurant", get(dashboard::get_restaurant))
        .route(
            "/api/dashboard/kitchen-status",
            get(dashboard::get_kitchen_status).put(dashboard::put_kitchen_status),
        )
        .route(
            "/api/dashboard/status-settings",
            get(dashboard::get_status_settings).patch(dashboard::patch_status_settings),
        )
        .route(
            "/api/dashboard/business-hours",
            get(dashboard::get_business_hours).put(dashboard::put_business_hours),
        )
        .route("/api/dashboard/menu", get(dashboard::get_menu))
        .route("/api/dashboard/ingredients", get(dashboard::list_ingredients))
        .route(
            "/api/dashboard/ingredients/{id}",
            patch(dashboard::patch_ingredient),
        )
        .layer(middleware::from_fn(require_owner))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let voice_api = Router::new()
        .route(
            "/api/voice/restaurants/{id}/kitchen-status",
            get(voice::kitchen_status),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            voice_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/auth/logout", post(auth::logout))
        .merge(pages)
        .merge(login)
        .merge(password)
        .merge(admin_api)
        .merge(owner_api)
        .merge(voice_api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
