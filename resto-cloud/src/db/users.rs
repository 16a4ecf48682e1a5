use async_trait::async_trait;
use shared::models::UserRole;
use sqlx::{PgConnection, PgPool};

use super::BoxError;
use crate::auth::session::AccountDirectory;

#[derive(Debug, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub hashed_password: String,
    pub role: String,
    pub must_change_password: bool,
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, BoxError> {
    let user = sqlx::query_as(
        "SELECT id, email, hashed_password, role, must_change_password FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn must_change_password(pool: &PgPool, id: &str) -> Result<Option<bool>, BoxError> {
    let flag = sqlx::query_scalar("SELECT must_change_password FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(flag)
}

#[async_trait]
impl AccountDirectory for PgPool {
    async fn must_change_password(&self, user_id: &str) -> Result<Option<bool>, BoxError> {
        must_change_password(self, user_id).await
    }
}

pub struct NewUser<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub hashed_password: &'a str,
    pub name: Option<&'a str>,
    pub role: UserRole,
    pub must_change_password: bool,
}

pub(crate) async fn insert(
    conn: &mut PgConnection,
    user: &NewUser<'_>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (id, email, hashed_password, name, role, must_change_password, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $7)",
    )
    .bind(user.id)
    .bind(user.email)
    .bind(user.hashed_password)
    .bind(user.name)
    .bind(user.role.as_db())
    .bind(user.must_change_password)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

/// Insert an account. Fails with a unique violation when the email is taken.
pub async fn create(pool: &PgPool, user: &NewUser<'_>, now: i64) -> Result<(), sqlx::Error> {
    let mut conn = pool.acquire().await?;
    insert(&mut conn, user, now).await
}

/// Replace the password hash and set or clear the forced-change flag.
pub async fn set_password(
    pool: &PgPool,
    id: &str,
    hashed_password: &str,
    must_change_password: bool,
    now: i64,
) -> Result<bool, BoxError> {
    let result = sqlx::query(
        "UPDATE users SET hashed_password = $1, must_change_password = $2, updated_at = $3 WHERE id = $4",
    )
    .bind(hashed_password)
    .bind(must_change_password)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
