//! Application state

use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::auth::{FirebaseVerifier, IdentityVerifier, RateLimiter, SessionKeys};
use crate::config::Config;
use crate::error::BoxError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Access token signing/verification
    pub sessions: SessionKeys,
    /// Refresh token lifetime in milliseconds
    pub refresh_token_ttl_ms: i64,
    /// Phone-ownership verification
    pub identity: Arc<dyn IdentityVerifier>,
    /// Rate limiter for credential routes
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Connect, run migrations and build the production state
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        let identity =
            FirebaseVerifier::new(&config.firebase_project_id, &config.firebase_jwks_url)?;

        Ok(Self::from_parts(pool, config, Arc::new(identity)))
    }

    /// Assemble state from an existing pool and identity verifier
    pub fn from_parts(pool: PgPool, config: &Config, identity: Arc<dyn IdentityVerifier>) -> Self {
        Self {
            pool,
            sessions: SessionKeys::new(&config.jwt_secret, config.access_token_minutes),
            refresh_token_ttl_ms: config.refresh_token_days * 24 * 60 * 60 * 1000,
            identity,
            rate_limiter: RateLimiter::new(),
        }
    }
}
