//! Back-office endpoints (administrators only)

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{KitchenContext, RestaurantStatus, UserRole};

use crate::auth::{ClientIp, SessionUser};
use crate::db;
use crate::db::restaurants::{NewRestaurant, RestaurantSummary};
use crate::db::users::NewUser;
use crate::error::ServiceError;
use crate::services::{kitchen, menu};
use crate::state::AppState;
use crate::util::{generate_temp_password, hash_password, normalize_email};

use super::ApiResult;

const MAX_NAME_LEN: usize = 120;

/// GET /api/admin/restaurants
pub async fn list_restaurants(State(state): State<AppState>) -> ApiResult<Vec<RestaurantSummary>> {
    Ok(Json(db::restaurants::list_summaries(&state.pool).await?))
}

/// POST /api/admin/restaurants
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRestaurantRequest {
    pub name: String,
    pub owner_email: String,
    pub owner_name: Option<String>,
    pub phone: Option<String>,
}

/// Trimmed and checked fields of a creation request
#[derive(Debug, PartialEq)]
pub struct ValidRestaurant {
    pub name: String,
    pub owner_email: String,
    pub owner_name: Option<String>,
    pub phone: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `local@domain.tld` shape only
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

pub fn validate_create(req: CreateRestaurantRequest) -> Result<ValidRestaurant, AppError> {
    let name = req.name.trim().to_string();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation(format!(
            "name must be between 1 and {MAX_NAME_LEN} characters"
        )));
    }

    let owner_email = normalize_email(&req.owner_email);
    if !is_plausible_email(&owner_email) {
        return Err(AppError::validation("ownerEmail must be a valid email address"));
    }

    Ok(ValidRestaurant {
        name,
        owner_email,
        owner_name: non_empty(req.owner_name),
        phone: non_empty(req.phone),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRestaurant {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub owner_email: String,
    pub status: RestaurantStatus,
    /// `false` when the credentials email could not be delivered
    pub email_sent: bool,
}

pub async fn create_restaurant(
    State(state): State<AppState>,
    ip: ClientIp,
    Extension(admin): Extension<SessionUser>,
    Json(req): Json<CreateRestaurantRequest>,
) -> ApiResult<CreatedRestaurant> {
    let valid = validate_create(req)?;

    let temp_password = generate_temp_password();
    let hashed =
        hash_password(&temp_password).map_err(|e| ServiceError::Db(e.to_string().into()))?;
    let owner_id = uuid::Uuid::new_v4().to_string();
    let restaurant_id = uuid::Uuid::new_v4().to_string();
    let now = shared::util::now_millis();

    let owner = NewUser {
        id: &owner_id,
        email: &valid.owner_email,
        hashed_password: &hashed,
        name: valid.owner_name.as_deref(),
        role: UserRole::Owner,
        must_change_password: true,
    };
    let restaurant = NewRestaurant {
        id: &restaurant_id,
        name: &valid.name,
        phone: valid.phone.as_deref(),
    };

    match db::restaurants::create_with_owner(&state.pool, &owner, &restaurant, now).await {
        Ok(()) => {}
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(AppError::already_exists("Owner account")
                .with_detail("ownerEmail", valid.owner_email.clone())
                .into());
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(
        restaurant_id = %restaurant_id,
        owner_email = %valid.owner_email,
        "Restaurant created"
    );
    let _ = db::audit::log(
        &state.pool,
        &admin.user_id,
        Some(&restaurant_id),
        "restaurant_created",
        Some(&serde_json::json!({ "name": valid.name, "ownerEmail": valid.owner_email })),
        ip.as_audit(),
        now,
    )
    .await;

    let email_sent = match state
        .email
        .send_welcome_credentials(&valid.owner_email, &valid.name, &temp_password)
        .await
    {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(owner_email = %valid.owner_email, "Welcome email failed: {e}");
            false
        }
    };

    Ok(Json(CreatedRestaurant {
        id: restaurant_id,
        name: valid.name,
        owner_id,
        owner_email: valid.owner_email,
        status: RestaurantStatus::Onboarding,
        email_sent,
    }))
}

#[derive(Debug, Serialize)]
pub struct RestaurantDetail {
    pub restaurant: RestaurantSummary,
    pub kitchen: KitchenContext,
}

pub async fn restaurant_detail(
    state: &AppState,
    restaurant_id: &str,
) -> Result<RestaurantDetail, ServiceError> {
    let summary = db::restaurants::find_summary(&state.pool, restaurant_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::RestaurantNotFound))?;
    let restaurant = db::restaurants::find_by_id(&state.pool, restaurant_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::RestaurantNotFound))?;
    let kitchen = kitchen::context_for(&state.pool, &restaurant).await?;
    Ok(RestaurantDetail {
        restaurant: summary,
        kitchen,
    })
}

/// GET /api/admin/restaurants/{id}
pub async fn get_restaurant(
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
) -> ApiResult<RestaurantDetail> {
    Ok(Json(restaurant_detail(&state, &restaurant_id).await?))
}

/// PATCH /api/admin/restaurants/{id}/status
#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub async fn update_status(
    State(state): State<AppState>,
    ip: ClientIp,
    Extension(admin): Extension<SessionUser>,
    Path(restaurant_id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<serde_json::Value> {
    let status = RestaurantStatus::from_db(req.status.trim()).ok_or_else(|| {
        AppError::with_message(
            ErrorCode::InvalidStatus,
            format!("Unknown restaurant status {}", req.status),
        )
    })?;

    let now = shared::util::now_millis();
    if !db::restaurants::update_status(&state.pool, &restaurant_id, status.as_db(), now).await? {
        return Err(AppError::new(ErrorCode::RestaurantNotFound).into());
    }

    tracing::info!(restaurant_id = %restaurant_id, status = status.as_db(), "Restaurant status changed");
    let _ = db::audit::log(
        &state.pool,
        &admin.user_id,
        Some(&restaurant_id),
        "restaurant_status_changed",
        Some(&serde_json::json!({ "status": status.as_db() })),
        ip.as_audit(),
        now,
    )
    .await;

    Ok(Json(serde_json::json!({
        "id": restaurant_id,
        "status": status,
    })))
}

/// POST /api/admin/restaurants/{id}/reset-owner-password
pub async fn reset_owner_password(
    State(state): State<AppState>,
    ip: ClientIp,
    Extension(admin): Extension<SessionUser>,
    Path(restaurant_id): Path<String>,
) -> ApiResult<serde_json::Value> {
    let summary = db::restaurants::find_summary(&state.pool, &restaurant_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::RestaurantNotFound))?;

    let temp_password = generate_temp_password();
    let hashed =
        hash_password(&temp_password).map_err(|e| ServiceError::Db(e.to_string().into()))?;
    let now = shared::util::now_millis();
    if !db::users::set_password(&state.pool, &summary.owner_id, &hashed, true, now).await? {
        return Err(AppError::not_found("Owner").into());
    }

    tracing::info!(restaurant_id = %restaurant_id, owner_id = %summary.owner_id, "Owner password reset");
    let _ = db::audit::log(
        &state.pool,
        &admin.user_id,
        Some(&restaurant_id),
        "owner_password_reset",
        Some(&serde_json::json!({ "ownerId": summary.owner_id })),
        ip.as_audit(),
        now,
    )
    .await;

    let email_sent = match state
        .email
        .send_password_reset(&summary.owner_email, &temp_password)
        .await
    {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(owner_email = %summary.owner_email, "Password reset email failed: {e}");
            false
        }
    };

    Ok(Json(serde_json::json!({ "emailSent": email_sent })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemPromptResponse {
    pub system_prompt: String,
}

/// GET /api/admin/restaurants/{id}/system-prompt
pub async fn get_system_prompt(
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
) -> ApiResult<SystemPromptResponse> {
    let system_prompt =
        menu::system_prompt_for(&state.pool, &restaurant_id, &state.default_transfer_phone)
            .await?;
    Ok(Json(SystemPromptResponse { system_prompt }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuJsonResponse {
    pub menu_json: String,
}

/// GET /api/admin/restaurants/{id}/menu-json
pub async fn get_menu_json(
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
) -> ApiResult<MenuJsonResponse> {
    let menu_json = menu::menu_json_for(&state.pool, &restaurant_id).await?;
    Ok(Json(MenuJsonResponse { menu_json }))
}
