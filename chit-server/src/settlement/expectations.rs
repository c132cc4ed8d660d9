//! Payment expectations and default contributions

use rust_decimal::{Decimal, RoundingStrategy};
use shared::models::{ChitSchedule, MemberRef};

use super::ChitLedger;

const DECIMAL_PLACES: u32 = 2;

/// A payment row the generator wants to exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedPayment {
    pub member: MemberRef,
    pub amount_paid: Decimal,
}

/// Expected payment for every participant of the schedule's chit.
///
/// The lifter receives `-(total_amount - lift_amount)`; everyone else owes
/// `no_lift_amount * slot_count`. The store inserts these with
/// first-write-wins semantics, so existing rows are never overwritten.
pub fn expected_payments(ledger: &ChitLedger, schedule: &ChitSchedule) -> Vec<ExpectedPayment> {
    let payout = -(ledger.chit.total_amount - schedule.lift_amount);

    ledger
        .participants()
        .map(|(member, slot_count)| {
            let amount_paid = if schedule.lifter == Some(member) {
                payout
            } else {
                schedule.no_lift_amount * Decimal::from(slot_count)
            };
            ExpectedPayment {
                member,
                amount_paid,
            }
        })
        .collect()
}

/// Default monthly contribution of each non-lifting slot:
/// `(total_amount - lift_amount) / (total_slots - 1)` rounded to 2 places
/// with banker's rounding, or zero for single-slot chits.
pub fn default_no_lift_amount(
    total_amount: Decimal,
    lift_amount: Decimal,
    total_slots: i32,
) -> Decimal {
    if total_slots <= 1 {
        return Decimal::ZERO;
    }
    ((total_amount - lift_amount) / Decimal::from(total_slots - 1))
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointNearestEven)
}
