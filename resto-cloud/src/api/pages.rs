//! Page view models, served behind the access policy
//!
//! Each page answers with the data its screen needs; redirects have already
//! happened in the middleware by the time these run.

use axum::{
    Extension, Json,
    extract::{Path, Request, State},
};
use serde_json::{Value, json};

use crate::auth::SessionUser;
use crate::db;
use crate::state::AppState;

use super::ApiResult;
use super::admin::restaurant_detail;
use super::dashboard::overview;

/// GET /login
pub async fn login_page() -> Json<Value> {
    Json(json!({ "view": "login" }))
}

/// GET /update-password
///
/// Reachable without a session; the form then fails on submit.
pub async fn update_password_page(request: Request) -> Json<Value> {
    let user = request.extensions().get::<SessionUser>();
    Json(json!({
        "view": "update-password",
        "email": user.map(|u| u.email.as_str()),
        "mustChangePassword": user.is_some_and(|u| u.must_change_password),
    }))
}

/// GET /admin
pub async fn admin_page(State(state): State<AppState>) -> ApiResult<Value> {
    let restaurants = db::restaurants::list_summaries(&state.pool).await?;
    Ok(Json(json!({
        "view": "admin",
        "restaurants": restaurants,
    })))
}

/// GET /admin/restaurants/{id}
pub async fn admin_restaurant_page(
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
) -> ApiResult<Value> {
    let detail = restaurant_detail(&state, &restaurant_id).await?;
    Ok(Json(json!({
        "view": "admin-restaurant",
        "restaurant": detail.restaurant,
        "kitchen": detail.kitchen,
    })))
}

/// GET /dashboard
pub async fn dashboard_page(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Value> {
    let overview = overview(&state, &user).await?;
    Ok(Json(json!({
        "view": "dashboard",
        "restaurant": overview.restaurant,
        "kitchen": overview.kitchen,
    })))
}
