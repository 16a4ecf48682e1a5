use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use super::BoxError;
use super::users::{self, NewUser};
use crate::services::kitchen::SettingsStore;

#[derive(Debug, sqlx::FromRow)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub status: String,
    pub kitchen_status: String,
    pub status_settings: Option<Value>,
    pub business_hours: Option<Value>,
}

const RESTAURANT_COLUMNS: &str =
    "id, name, phone, status, kitchen_status, status_settings, business_hours";

/// Back-office listing row
#[derive(Debug, sqlx::FromRow, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantSummary {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub status: String,
    pub kitchen_status: String,
    pub owner_id: String,
    pub owner_email: String,
    pub owner_name: Option<String>,
    pub created_at: i64,
}

pub struct NewRestaurant<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub phone: Option<&'a str>,
}

const SUMMARY_SELECT: &str = r#"
    SELECT r.id, r.name, r.phone, r.status, r.kitchen_status,
           r.owner_id, u.email AS owner_email, u.name AS owner_name, r.created_at
    FROM restaurants r
    JOIN users u ON u.id = r.owner_id
"#;

pub async fn list_summaries(pool: &PgPool) -> Result<Vec<RestaurantSummary>, BoxError> {
    let rows = sqlx::query_as(&format!("{SUMMARY_SELECT} ORDER BY r.created_at DESC"))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_summary(pool: &PgPool, id: &str) -> Result<Option<RestaurantSummary>, BoxError> {
    let row = sqlx::query_as(&format!("{SUMMARY_SELECT} WHERE r.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Restaurant>, BoxError> {
    let row = sqlx::query_as(&format!(
        "SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// The restaurant operated by `owner_id` (oldest first if there are several)
pub async fn find_by_owner(pool: &PgPool, owner_id: &str) -> Result<Option<Restaurant>, BoxError> {
    let row = sqlx::query_as(&format!(
        "SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE owner_id = $1 ORDER BY created_at, id LIMIT 1"
    ))
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Create an owner account and its restaurant atomically.
///
/// The restaurant starts in `onboarding` with kitchen `NORMAL` and no stored
/// settings. A taken email surfaces as a unique violation.
pub async fn create_with_owner(
    pool: &PgPool,
    owner: &NewUser<'_>,
    restaurant: &NewRestaurant<'_>,
    now: i64,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    users::insert(&mut tx, owner, now).await?;

    sqlx::query(
        r#"
        INSERT INTO restaurants (id, owner_id, name, phone, status, kitchen_status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, 'onboarding', 'NORMAL', $5, $5)
        "#,
    )
    .bind(restaurant.id)
    .bind(owner.id)
    .bind(restaurant.name)
    .bind(restaurant.phone)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn update_status(
    pool: &PgPool,
    id: &str,
    status: &str,
    now: i64,
) -> Result<bool, BoxError> {
    let result = sqlx::query("UPDATE restaurants SET status = $1, updated_at = $2 WHERE id = $3")
        .bind(status)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_kitchen_status(
    pool: &PgPool,
    id: &str,
    kitchen_status: &str,
    now: i64,
) -> Result<bool, BoxError> {
    let result =
        sqlx::query("UPDATE restaurants SET kitchen_status = $1, updated_at = $2 WHERE id = $3")
            .bind(kitchen_status)
            .bind(now)
            .bind(id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

/// Write `defaults` if the restaurant has no settings yet, and return what is
/// stored afterwards. `None` when the restaurant does not exist.
pub async fn ensure_status_settings(
    pool: &PgPool,
    id: &str,
    defaults: &Value,
    now: i64,
) -> Result<Option<Value>, BoxError> {
    let written: Option<(Value,)> = sqlx::query_as(
        r#"
        UPDATE restaurants SET status_settings = $1, updated_at = $2
        WHERE id = $3 AND status_settings IS NULL
        RETURNING status_settings
        "#,
    )
    .bind(defaults)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    if let Some((value,)) = written {
        tracing::info!(restaurant_id = %id, "Default status settings materialized");
        return Ok(Some(value));
    }

    let stored: Option<(Option<Value>,)> =
        sqlx::query_as("SELECT status_settings FROM restaurants WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(stored.map(|(value,)| value.unwrap_or_else(|| defaults.clone())))
}

pub async fn save_status_settings(
    pool: &PgPool,
    id: &str,
    settings: &Value,
    now: i64,
) -> Result<bool, BoxError> {
    let result =
        sqlx::query("UPDATE restaurants SET status_settings = $1, updated_at = $2 WHERE id = $3")
            .bind(settings)
            .bind(now)
            .bind(id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

#[async_trait]
impl SettingsStore for PgPool {
    async fn ensure_status_settings(
        &self,
        restaurant_id: &str,
        defaults: &Value,
        now: i64,
    ) -> Result<Option<Value>, BoxError> {
        ensure_status_settings(self, restaurant_id, defaults, now).await
    }

    async fn save_status_settings(
        &self,
        restaurant_id: &str,
        settings: &Value,
        now: i64,
    ) -> Result<bool, BoxError> {
        save_status_settings(self, restaurant_id, settings, now).await
    }
}

pub async fn save_business_hours(
    pool: &PgPool,
    id: &str,
    hours: &Value,
    now: i64,
) -> Result<bool, BoxError> {
    let result =
        sqlx::query("UPDATE restaurants SET business_hours = $1, updated_at = $2 WHERE id = $3")
            .bind(hours)
            .bind(now)
            .bind(id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}
