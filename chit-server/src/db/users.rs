//! User accounts

use shared::models::User;
use shared::util::now_millis;
use sqlx::{PgExecutor, PgPool};

const USER_COLUMNS: &str =
    "id, phone_number, name, password_hash, is_verified, is_active, is_staff, created_at";

pub async fn find_by_phone(pool: &PgPool, phone_number: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE phone_number = $1"))
        .bind(phone_number)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, user_id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Create a user whose phone number was proven by the identity provider
pub async fn create_verified(
    pool: &PgPool,
    phone_number: &str,
    name: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    sqlx::query_as(&format!(
        r#"
        INSERT INTO users (phone_number, name, password_hash, is_verified, created_at)
        VALUES ($1, $2, $3, TRUE, $4)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(phone_number)
    .bind(name)
    .bind(password_hash)
    .bind(now_millis())
    .fetch_one(pool)
    .await
}

pub async fn update_password<'e>(
    db: impl PgExecutor<'e>,
    user_id: i64,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(password_hash)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

/// Replace a user's password and revoke every refresh token they hold.
/// Returns the number of revoked tokens.
pub async fn reset_password(
    pool: &PgPool,
    user_id: i64,
    password_hash: &str,
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    update_password(&mut *tx, user_id, password_hash).await?;
    let revoked = super::refresh_tokens::revoke_all(&mut *tx, user_id).await?;
    tx.commit().await?;
    Ok(revoked)
}
