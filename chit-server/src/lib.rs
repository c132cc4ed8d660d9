//! chit-server: chit-fund ledger backend
//!
//! - `settlement`: pure month, slot, payment and dashboard rules
//! - `db`: PostgreSQL ledger store
//! - `api`: axum handlers and router
//! - `auth`: session tokens, phone identity verification, rate limiting

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod settlement;
pub mod state;
pub mod util;

pub use config::Config;
pub use state::AppState;
