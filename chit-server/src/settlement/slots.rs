//! Slot accounting across verified and external members

use serde::Serialize;
use shared::error::{AppError, ErrorCode};

use super::ChitLedger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotUsage {
    pub total_slots: i64,
    pub used_slots: i64,
    pub available_slots: i64,
}

impl SlotUsage {
    pub fn new(total_slots: i32, used_slots: i64) -> Self {
        let total_slots = i64::from(total_slots);
        Self {
            total_slots,
            used_slots,
            available_slots: total_slots - used_slots,
        }
    }

    pub fn of(ledger: &ChitLedger) -> Self {
        let used = ledger
            .participants()
            .map(|(_, slots)| i64::from(slots))
            .sum();
        Self::new(ledger.chit.total_slots, used)
    }
}

/// Reject taking `requested` more slots when they do not fit.
///
/// Callers hold the chit row lock while computing `used_slots` and until
/// the insert or update that consumes the slots has run.
pub fn ensure_capacity(total_slots: i32, used_slots: i64, requested: i64) -> Result<(), AppError> {
    let usage = SlotUsage::new(total_slots, used_slots);
    if requested > usage.available_slots {
        let available = usage.available_slots.max(0);
        return Err(AppError::new(ErrorCode::SlotCapacityExceeded)
            .with_detail(
                "slot_count",
                format!("Only {available} slot(s) available, {requested} requested"),
            )
            .with_detail("available_slots", available));
    }
    Ok(())
}
