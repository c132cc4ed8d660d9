//! Refresh token storage
//!
//! Refresh tokens are opaque random ids. Each use rotates the token: the old
//! row is revoked and a new one issued in the same statement sequence.

use shared::util::now_millis;
use sqlx::{PgExecutor, PgPool};

/// Issue a new refresh token for a user
pub async fn create(pool: &PgPool, user_id: i64, ttl_ms: i64) -> Result<String, sqlx::Error> {
    let token_id = uuid::Uuid::new_v4().to_string();
    let now = now_millis();

    sqlx::query(
        "INSERT INTO refresh_tokens (id, user_id, expires_at, created_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(&token_id)
    .bind(user_id)
    .bind(now + ttl_ms)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(token_id)
}

/// Consume a valid refresh token and issue its replacement.
/// Returns `(user_id, new_refresh_token)`, or `None` if the token is unknown,
/// revoked or expired.
pub async fn rotate(
    pool: &PgPool,
    refresh_token: &str,
    ttl_ms: i64,
) -> Result<Option<(i64, String)>, sqlx::Error> {
    // Revoking and reading in one statement stops a token being used twice
    let user_id: Option<(i64,)> = sqlx::query_as(
        r#"
        UPDATE refresh_tokens SET revoked = TRUE
        WHERE id = $1 AND NOT revoked AND expires_at > $2
        RETURNING user_id
        "#,
    )
    .bind(refresh_token)
    .bind(now_millis())
    .fetch_optional(pool)
    .await?;

    let Some((user_id,)) = user_id else {
        return Ok(None);
    };

    let new_token = create(pool, user_id, ttl_ms).await?;
    Ok(Some((user_id, new_token)))
}

/// Revoke all refresh tokens for a user
pub async fn revoke_all<'e>(db: impl PgExecutor<'e>, user_id: i64) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = $1 AND NOT revoked")
            .bind(user_id)
            .execute(db)
            .await?;
    Ok(result.rows_affected())
}
