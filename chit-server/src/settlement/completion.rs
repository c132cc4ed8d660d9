//! Chit completion validation

use shared::models::CompletionReport;

use super::ChitLedger;

/// A chit is complete when every month has a lifter, no payment is still
/// pending or late, and every month has at least one payment row.
pub fn validate_completion(ledger: &ChitLedger) -> CompletionReport {
    let mut issues = Vec::new();

    let unassigned = ledger.schedules.iter().filter(|s| !s.is_lifted()).count();
    if unassigned > 0 {
        issues.push(format!("{unassigned} month(s) don't have lifters assigned"));
    }

    let outstanding = ledger
        .payments
        .iter()
        .filter(|p| p.status.is_outstanding())
        .count();
    if outstanding > 0 {
        issues.push(format!("{outstanding} payment(s) are still pending or late"));
    }

    let without_payments = ledger
        .schedules
        .iter()
        .filter(|s| ledger.payments_for_schedule(s.id).next().is_none())
        .count();
    if without_payments > 0 {
        issues.push(format!("{without_payments} month(s) have no payment records"));
    }

    CompletionReport {
        is_valid: issues.is_empty(),
        issues,
    }
}
