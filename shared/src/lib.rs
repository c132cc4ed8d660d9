//! Shared types for the chit ledger
//!
//! Wire and domain types used by the server and its clients: the error
//! system, ledger models, request/response payloads and small utilities.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
