//! Bulk payment status updates

use std::collections::HashSet;

use shared::models::{BulkPaymentEntry, BulkPaymentError, PaymentStatus};

use super::ChitLedger;

/// Split bulk entries into applicable `(payment_id, status)` pairs and
/// per-entry errors. Only payments of this chit are applicable.
pub fn plan_bulk_update(
    ledger: &ChitLedger,
    entries: &[BulkPaymentEntry],
) -> (Vec<(i64, PaymentStatus)>, Vec<BulkPaymentError>) {
    let known: HashSet<i64> = ledger.payments.iter().map(|p| p.id).collect();
    let mut updates = Vec::new();
    let mut errors = Vec::new();

    for entry in entries {
        let (Some(payment_id), Some(status)) = (entry.payment_id, entry.status.as_deref()) else {
            errors.push(BulkPaymentError {
                payment_id: entry.payment_id,
                error: "Missing payment_id or status".to_string(),
            });
            continue;
        };

        let Some(status) = PaymentStatus::from_db(status) else {
            errors.push(BulkPaymentError {
                payment_id: Some(payment_id),
                error: "Invalid status".to_string(),
            });
            continue;
        };

        if !known.contains(&payment_id) {
            errors.push(BulkPaymentError {
                payment_id: Some(payment_id),
                error: "Payment not found".to_string(),
            });
            continue;
        }

        updates.push((payment_id, status));
    }

    (updates, errors)
}
