//! Phone-ownership verification through an external identity provider
//!
//! Signup and password reset accept an ID token from the client's phone
//! sign-in flow. [`IdentityVerifier`] turns that token into a verified phone
//! number; [`FirebaseVerifier`] is the production implementation.

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Google rotates signing keys daily; an hour keeps well inside that
const KEY_SET_TTL: Duration = Duration::from_secs(3600);
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity proven by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub uid: String,
    pub phone_number: String,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, AppError>;
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    phone_number: Option<String>,
}

fn invalid_token(reason: &str) -> AppError {
    AppError::with_message(ErrorCode::IdentityTokenInvalid, format!("Invalid ID token: {reason}"))
}

fn identity_from_claims(claims: IdTokenClaims) -> Result<VerifiedIdentity, AppError> {
    if claims.sub.is_empty() {
        return Err(invalid_token("empty subject"));
    }
    let phone_number = claims
        .phone_number
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::new(ErrorCode::PhoneNumberMissing))?;
    Ok(VerifiedIdentity {
        uid: claims.sub,
        phone_number,
    })
}

struct CachedKeys {
    set: JwkSet,
    fetched_at: Instant,
}

/// Verifies Firebase ID tokens (RS256) against Google's published key set
pub struct FirebaseVerifier {
    project_id: String,
    jwks_url: String,
    http: reqwest::Client,
    keys: RwLock<Option<CachedKeys>>,
}

impl FirebaseVerifier {
    pub fn new(
        project_id: impl Into<String>,
        jwks_url: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            project_id: project_id.into(),
            jwks_url: jwks_url.into(),
            http,
            keys: RwLock::new(None),
        })
    }

    fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }

    async fn fetch_keys(&self) -> Result<JwkSet, AppError> {
        let unavailable = |e: reqwest::Error| {
            tracing::error!(error = %e, url = %self.jwks_url, "Failed to fetch identity key set");
            AppError::new(ErrorCode::IdentityProviderUnavailable)
        };
        self.http
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(unavailable)?
            .json::<JwkSet>()
            .await
            .map_err(unavailable)
    }

    /// Key for `kid`, refetching the set when stale or when `kid` is unknown
    async fn key_for(&self, kid: &str) -> Result<Jwk, AppError> {
        {
            let cached = self.keys.read().await;
            if let Some(c) = cached.as_ref()
                && c.fetched_at.elapsed() < KEY_SET_TTL
                && let Some(jwk) = c.set.find(kid)
            {
                return Ok(jwk.clone());
            }
        }

        let set = self.fetch_keys().await?;
        let jwk = set.find(kid).cloned();
        *self.keys.write().await = Some(CachedKeys {
            set,
            fetched_at: Instant::now(),
        });
        tracing::debug!(kid, "Identity key set refreshed");

        jwk.ok_or_else(|| invalid_token("unknown signing key"))
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, AppError> {
        let header = jsonwebtoken::decode_header(id_token).map_err(|_| invalid_token("malformed"))?;
        if header.alg != Algorithm::RS256 {
            return Err(invalid_token("unexpected algorithm"));
        }
        let kid = header.kid.ok_or_else(|| invalid_token("missing key id"))?;

        let jwk = self.key_for(&kid).await?;
        let key = DecodingKey::from_jwk(&jwk).map_err(|_| invalid_token("unusable signing key"))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[self.issuer()]);

        let data = jsonwebtoken::decode::<IdTokenClaims>(id_token, &key, &validation).map_err(|e| {
            tracing::debug!("ID token rejected: {e}");
            invalid_token("verification failed")
        })?;

        identity_from_claims(data.claims)
    }
}
