//! Ledger data models
//!
//! Shared between the server and its clients (via the JSON API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (Postgres BIGSERIAL); money is `rust_decimal::Decimal`.

pub mod chit;
pub mod member;
pub mod payment;
pub mod report;
pub mod schedule;
pub mod user;

// Re-exports
pub use chit::*;
pub use member::*;
pub use payment::*;
pub use report::*;
pub use schedule::*;
pub use user::*;
