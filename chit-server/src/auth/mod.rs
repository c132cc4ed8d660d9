//! Authentication: session tokens, identity verification, rate limiting

pub mod identity;
pub mod rate_limit;
pub mod session;

pub use identity::{FirebaseVerifier, IdentityVerifier, VerifiedIdentity};
pub use rate_limit::RateLimiter;
pub use session::{Principal, SessionKeys};
