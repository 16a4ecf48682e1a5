//! Audit log operations

use sqlx::PgPool;

use super::BoxError;

/// Write an audit log entry
pub async fn log(
    pool: &PgPool,
    user_id: &str,
    restaurant_id: Option<&str>,
    action: &str,
    detail: Option<&serde_json::Value>,
    ip_address: Option<&str>,
    now: i64,
) -> Result<(), BoxError> {
    sqlx::query(
        "INSERT INTO audit_logs (user_id, restaurant_id, action, detail, ip_address, created_at) VALUES ($1, $2, $3, $4, $5, $6)"
    )
    .bind(user_id)
    .bind(restaurant_id)
    .bind(action)
    .bind(detail)
    .bind(ip_address)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}
