//! Voice assistant endpoints (shared-secret authenticated)

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::KitchenContext;

use crate::db;
use crate::services::kitchen;
use crate::state::AppState;

use super::ApiResult;

/// GET /api/voice/restaurants/{id}/kitchen-status
pub async fn kitchen_status(
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
) -> ApiResult<KitchenContext> {
    let restaurant = db::restaurants::find_by_id(&state.pool, &restaurant_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::RestaurantNotFound))?;
    Ok(Json(kitchen::context_for(&state.pool, &restaurant).await?))
}
