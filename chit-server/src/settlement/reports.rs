//! Member- and month-level payment reports

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    MemberContribution, MemberHistory, MemberHistoryEntry, MemberRef, MonthlyPaymentEntry,
    MonthlyStatus, PaymentReminder, PaymentReminders, PaymentStatus, ScheduleAmounts,
};

use super::{ChitLedger, current_month};

/// Payments of one member ordered by month; negative amounts mark the lift
pub fn member_history(ledger: &ChitLedger, member: MemberRef) -> MemberHistory {
    let mut payment_history: Vec<MemberHistoryEntry> = ledger
        .payments_of(member)
        .map(|p| MemberHistoryEntry {
            payment_id: p.id,
            month_number: p.month_number,
            amount_paid: p.amount_paid,
            status: p.status,
            payment_date: p.payment_date,
            is_lifter: p.is_lifter_payout(),
        })
        .collect();
    payment_history.sort_by_key(|e| (e.month_number, e.payment_id));

    MemberHistory {
        member_id: member.id(),
        member_type: member.kind(),
        payment_history,
    }
}

/// Totals paid in and received across all months
pub fn member_contribution(ledger: &ChitLedger, member: MemberRef) -> MemberContribution {
    let mut total_paid = Decimal::ZERO;
    let mut total_received = Decimal::ZERO;
    let mut payment_count = 0;

    for payment in ledger.payments_of(member) {
        payment_count += 1;
        if payment.amount_paid > Decimal::ZERO {
            total_paid += payment.amount_paid;
        } else {
            total_received += payment.amount_paid.abs();
        }
    }

    MemberContribution {
        total_paid,
        total_received,
        net_amount: total_paid - total_received,
        payment_count,
    }
}

/// Every payment of a month with payer details
pub fn monthly_status(ledger: &ChitLedger, month_number: i32) -> Result<MonthlyStatus, AppError> {
    let schedule = ledger.schedule_for_month(month_number).ok_or_else(|| {
        AppError::with_message(
            ErrorCode::ScheduleNotFound,
            format!("No schedule for month {month_number}"),
        )
    })?;

    let payments = ledger
        .payments_for_schedule(schedule.id)
        .filter_map(|p| {
            let member = ledger.payer_info(p.member)?;
            Some(MonthlyPaymentEntry {
                payment_id: p.id,
                member,
                amount_paid: p.amount_paid,
                status: p.status,
                payment_date: p.payment_date,
                is_lifter: p.is_lifter_payout(),
            })
        })
        .collect();

    Ok(MonthlyStatus {
        month_number,
        schedule: ScheduleAmounts {
            lift_amount: schedule.lift_amount,
            no_lift_amount: schedule.no_lift_amount,
        },
        payments,
    })
}

/// Outstanding payments of the current month.
///
/// Late payments report whole days elapsed since their `payment_date`;
/// pending ones report zero.
pub fn payment_reminders(ledger: &ChitLedger, today: NaiveDate) -> PaymentReminders {
    let Some(month) = current_month(ledger.chit.start_date, ledger.chit.duration_months, today)
    else {
        return PaymentReminders {
            message: Some("No active month for reminders".to_string()),
            month_number: None,
            total_pending: 0,
            reminders: Vec::new(),
        };
    };

    let Some(schedule) = ledger.schedule_for_month(month) else {
        return PaymentReminders {
            message: Some("Schedule not found".to_string()),
            month_number: Some(month),
            total_pending: 0,
            reminders: Vec::new(),
        };
    };

    let reminders: Vec<PaymentReminder> = ledger
        .payments_for_schedule(schedule.id)
        .filter(|p| p.status.is_outstanding())
        .filter_map(|p| {
            let member = ledger.payer_info(p.member)?;
            let days_overdue = match p.status {
                PaymentStatus::Late => days_since(p.payment_date, today),
                _ => 0,
            };
            Some(PaymentReminder {
                payment_id: p.id,
                member,
                amount_due: p.amount_paid,
                status: p.status,
                days_overdue,
            })
        })
        .collect();

    PaymentReminders {
        message: None,
        month_number: Some(month),
        total_pending: reminders.len(),
        reminders,
    }
}

fn days_since(epoch_millis: i64, today: NaiveDate) -> i64 {
    DateTime::from_timestamp_millis(epoch_millis)
        .map(|dt| (today - dt.date_naive()).num_days())
        .unwrap_or(0)
}
