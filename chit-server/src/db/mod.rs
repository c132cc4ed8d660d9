//! Ledger store (PostgreSQL)

pub mod chits;
pub mod ledger;
pub mod members;
pub mod payments;
pub mod refresh_tokens;
pub mod schedules;
pub mod users;
