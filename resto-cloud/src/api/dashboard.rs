//! Owner dashboard endpoints, scoped to the caller's own restaurant

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::error::{AppError, ErrorCode};
use shared::models::{BusinessHours, KitchenContext, KitchenStatus, MenuCategory, StatusSettings};

use crate::auth::{ClientIp, SessionUser};
use crate::db;
use crate::db::menu::IngredientRow;
use crate::db::restaurants::Restaurant;
use crate::error::ServiceResult;
use crate::services::{kitchen, menu};
use crate::state::AppState;

use super::ApiResult;

/// Restaurant as shown to its owner
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantView {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub status: String,
    pub kitchen_status: String,
    pub business_hours: Option<Value>,
}

impl From<&Restaurant> for RestaurantView {
    fn from(r: &Restaurant) -> Self {
        Self {
            id: r.id.clone(),
            name: r.name.clone(),
            phone: r.phone.clone(),
            status: r.status.clone(),
            kitchen_status: r.kitchen_status.clone(),
            business_hours: r.business_hours.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RestaurantOverview {
    pub restaurant: RestaurantView,
    pub kitchen: KitchenContext,
}

/// The restaurant operated by the session user
pub async fn owned_restaurant(state: &AppState, user: &SessionUser) -> ServiceResult<Restaurant> {
    let restaurant = db::restaurants::find_by_owner(&state.pool, &user.user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::RestaurantNotFound))?;
    Ok(restaurant)
}

pub async fn overview(state: &AppState, user: &SessionUser) -> ServiceResult<RestaurantOverview> {
    let restaurant = owned_restaurant(state, user).await?;
    let kitchen = kitchen::context_for(&state.pool, &restaurant).await?;
    Ok(RestaurantOverview {
        restaurant: RestaurantView::from(&restaurant),
        kitchen,
    })
}

/// GET /api/dashboard/restaurant
pub async fn get_restaurant(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<RestaurantOverview> {
    Ok(Json(overview(&state, &user).await?))
}

/// GET /api/dashboard/kitchen-status
pub async fn get_kitchen_status(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<KitchenContext> {
    let restaurant = owned_restaurant(&state, &user).await?;
    Ok(Json(kitchen::context_for(&state.pool, &restaurant).await?))
}

/// PUT /api/dashboard/kitchen-status
#[derive(Deserialize)]
pub struct KitchenStatusRequest {
    pub status: String,
}

pub async fn put_kitchen_status(
    State(state): State<AppState>,
    ip: ClientIp,
    Extension(user): Extension<SessionUser>,
    Json(req): Json<KitchenStatusRequest>,
) -> ApiResult<KitchenContext> {
    let status = KitchenStatus::from_db(req.status.trim()).ok_or_else(|| {
        AppError::with_message(
            ErrorCode::InvalidStatus,
            format!("Unknown kitchen status {}", req.status),
        )
    })?;

    let mut restaurant = owned_restaurant(&state, &user).await?;
    let now = shared::util::now_millis();
    if !db::restaurants::update_kitchen_status(&state.pool, &restaurant.id, status.as_db(), now)
        .await?
    {
        return Err(AppError::new(ErrorCode::RestaurantNotFound).into());
    }

    let _ = db::audit::log(
        &state.pool,
        &user.user_id,
        Some(&restaurant.id),
        "kitchen_status_changed",
        Some(&serde_json::json!({ "from": restaurant.kitchen_status, "to": status.as_db() })),
        ip.as_audit(),
        now,
    )
    .await;
    tracing::info!(restaurant_id = %restaurant.id, status = status.as_db(), "Kitchen status changed");

    restaurant.kitchen_status = status.as_db().to_string();
    Ok(Json(kitchen::context_for(&state.pool, &restaurant).await?))
}

/// GET /api/dashboard/status-settings
pub async fn get_status_settings(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<StatusSettings> {
    let restaurant = owned_restaurant(&state, &user).await?;
    Ok(Json(kitchen::settings_for(&state.pool, &restaurant).await?))
}

/// PATCH /api/dashboard/status-settings
pub async fn patch_status_settings(
    State(state): State<AppState>,
    ip: ClientIp,
    Extension(user): Extension<SessionUser>,
    Json(update): Json<Value>,
) -> ApiResult<StatusSettings> {
    let restaurant = owned_restaurant(&state, &user).await?;
    let merged = kitchen::update_settings(&state.pool, &restaurant, &update).await?;

    let now = shared::util::now_millis();
    let _ = db::audit::log(
        &state.pool,
        &user.user_id,
        Some(&restaurant.id),
        "status_settings_updated",
        Some(&update),
        ip.as_audit(),
        now,
    )
    .await;

    Ok(Json(merged))
}

/// GET /api/dashboard/business-hours
pub async fn get_business_hours(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Value> {
    let restaurant = owned_restaurant(&state, &user).await?;
    Ok(Json(restaurant.business_hours.unwrap_or(Value::Null)))
}

/// PUT /api/dashboard/business-hours
pub async fn put_business_hours(
    State(state): State<AppState>,
    ip: ClientIp,
    Extension(user): Extension<SessionUser>,
    Json(raw): Json<Value>,
) -> ApiResult<BusinessHours> {
    let hours = BusinessHours::from_value(&raw)
        .map_err(|e| AppError::with_message(ErrorCode::InvalidBusinessHours, e.to_string()))?;

    let restaurant = owned_restaurant(&state, &user).await?;
    let stored = serde_json::to_value(&hours)?;
    let now = shared::util::now_millis();
    if !db::restaurants::save_business_hours(&state.pool, &restaurant.id, &stored, now).await? {
        return Err(AppError::new(ErrorCode::RestaurantNotFound).into());
    }

    let _ = db::audit::log(
        &state.pool,
        &user.user_id,
        Some(&restaurant.id),
        "business_hours_updated",
        Some(&stored),
        ip.as_audit(),
        now,
    )
    .await;

    Ok(Json(hours))
}

/// GET /api/dashboard/menu
pub async fn get_menu(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Vec<MenuCategory>> {
    let restaurant = owned_restaurant(&state, &user).await?;
    Ok(Json(menu::load_menu(&state.pool, &restaurant.id).await?))
}

/// GET /api/dashboard/ingredients
pub async fn list_ingredients(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Vec<IngredientRow>> {
    let restaurant = owned_restaurant(&state, &user).await?;
    Ok(Json(
        db::menu::list_ingredients(&state.pool, &restaurant.id).await?,
    ))
}

/// PATCH /api/dashboard/ingredients/{id}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientAvailabilityRequest {
    pub is_available: bool,
}

pub async fn patch_ingredient(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(ingredient_id): Path<i64>,
    Json(req): Json<IngredientAvailabilityRequest>,
) -> ApiResult<Value> {
    let restaurant = owned_restaurant(&state, &user).await?;
    let updated = db::menu::set_ingredient_availability(
        &state.pool,
        &restaurant.id,
        ingredient_id,
        req.is_available,
    )
    .await?;
    if !updated {
        return Err(AppError::new(ErrorCode::IngredientNotFound).into());
    }

    tracing::info!(
        restaurant_id = %restaurant.id,
        ingredient_id,
        is_available = req.is_available,
        "Ingredient availability changed"
    );
    Ok(Json(serde_json::json!({
        "id": ingredient_id,
        "isAvailable": req.is_available,
    })))
}
