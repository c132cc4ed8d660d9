//! Session access tokens and the authenticated principal
//!
//! Access tokens are HS256 JWTs carrying the user id and phone number.
//! Handlers receive a [`Principal`] extracted from the `Authorization:
//! Bearer` header instead of reading any ambient request context.

use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::AppError;

use crate::state::AppState;

/// JWT claims for session authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID
    pub sub: String,
    /// Verified phone number
    pub phone: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub phone_number: String,
}

/// Issues and verifies access tokens
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: chrono::Duration,
}

impl SessionKeys {
    pub fn new(secret: &str, access_token_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: chrono::Duration::minutes(access_token_minutes),
        }
    }

    /// Create an access token for a user
    pub fn issue(&self, user_id: i64, phone: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            phone: phone.to_string(),
            exp: (now + self.access_ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
    }

    /// Validate an access token
    pub fn verify(&self, token: &str) -> Result<Principal, AppError> {
        let validation = Validation::default();
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &validation)
            .map_err(|e| {
                tracing::debug!("Session token rejected: {e}");
                match e.kind() {
                    ErrorKind::ExpiredSignature => AppError::token_expired(),
                    _ => AppError::invalid_token("Invalid token"),
                }
            })?;

        let user_id = data
            .claims
            .sub
            .parse()
            .map_err(|_| AppError::invalid_token("Malformed token subject"))?;

        Ok(Principal {
            user_id,
            phone_number: data.claims.phone,
        })
    }
}

/// `Bearer <token>` from an Authorization header value
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(principal.clone());
        }

        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(AppError::not_authenticated)?;

        let token = bearer_token(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?;

        let principal = state.sessions.verify(token)?;
        parts.extensions.insert(principal.clone());
        Ok(principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    #[test]
    fn issued_token_verifies() {
        let keys = SessionKeys::new("test-secret", 60);
        let token = keys.issue(42, "+919876543210").unwrap();
        let principal = keys.verify(&token).unwrap();
        assert_eq!(principal.user_id, 42);
        assert_eq!(principal.phone_number, "+919876543210");
    }

    #[test]
    fn token_from_other_secret_is_invalid() {
        let token = SessionKeys::new("one", 60).issue(1, "+91").unwrap();
        let err = SessionKeys::new("two", 60).verify(&token).unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        // Beyond the default 60s leeway
        let keys = SessionKeys::new("test-secret", -10);
        let token = keys.issue(1, "+91").unwrap();
        let err = keys.verify(&token).unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenExpired);
    }

    #[test]
    fn bearer_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic abc"), None);
    }
}
