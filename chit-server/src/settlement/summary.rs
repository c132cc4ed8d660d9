//! Payment summary per chit month

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{LifterInfo, MonthlyReport, PaymentStatus, PaymentSummary};

use super::ChitLedger;

/// Collection figures for `month_number`.
///
/// `total_expected` assumes exactly one slot belongs to the lifter, however
/// many slots the lifter actually holds. Only paid, positive amounts count
/// as collected; lifter payouts are negative and excluded.
pub fn payment_summary(ledger: &ChitLedger, month_number: i32) -> Result<PaymentSummary, AppError> {
    let schedule = ledger.schedule_for_month(month_number).ok_or_else(|| {
        AppError::with_message(
            ErrorCode::ScheduleNotFound,
            format!("No schedule for month {month_number}"),
        )
    })?;

    let contributing_slots = Decimal::from(ledger.chit.total_slots - 1);
    let total_expected = schedule.no_lift_amount * contributing_slots;

    let mut total_collected = Decimal::ZERO;
    let (mut paid_count, mut pending_count, mut late_count) = (0, 0, 0);
    for payment in ledger.payments_for_schedule(schedule.id) {
        match payment.status {
            PaymentStatus::Paid => {
                paid_count += 1;
                if payment.amount_paid > Decimal::ZERO {
                    total_collected += payment.amount_paid;
                }
            }
            PaymentStatus::Pending => pending_count += 1,
            PaymentStatus::Late => late_count += 1,
        }
    }

    let lifter = schedule.lifter.map(|member| LifterInfo {
        name: ledger
            .member_name(member)
            .unwrap_or_else(|| shared::models::UNKNOWN_MEMBER_NAME.to_string()),
        member_type: member.kind(),
    });

    Ok(PaymentSummary {
        month_number,
        lift_amount: schedule.lift_amount,
        no_lift_amount: schedule.no_lift_amount,
        total_expected,
        total_collected,
        balance: total_expected - total_collected,
        paid_count,
        pending_count,
        late_count,
        lifter,
    })
}

/// Summaries for every month that has a schedule row
pub fn monthly_report(ledger: &ChitLedger) -> MonthlyReport {
    let monthly_reports = (1..=ledger.chit.duration_months)
        .filter_map(|month| payment_summary(ledger, month).ok())
        .collect();

    MonthlyReport {
        chit_id: ledger.chit.id,
        title: ledger.chit.title.clone(),
        total_months: ledger.chit.duration_months,
        monthly_reports,
    }
}
