//! Settlement read models: payment summaries, eligibility, completion and
//! dashboard views.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::member::{MemberEntry, MemberKind};
use super::payment::PaymentStatus;
use crate::error::AppError;

/// Who lifted a month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifterInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub member_type: MemberKind,
}

/// Collection figures for one chit month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub month_number: i32,
    pub lift_amount: Decimal,
    pub no_lift_amount: Decimal,
    pub total_expected: Decimal,
    pub total_collected: Decimal,
    pub balance: Decimal,
    pub paid_count: usize,
    pub pending_count: usize,
    pub late_count: usize,
    pub lifter: Option<LifterInfo>,
}

/// Lift eligibility verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Eligibility {
    pub can_lift: bool,
    pub reason: String,
}

/// Chit completion verdict; `issues` is empty iff `is_valid`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub is_valid: bool,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberHistoryEntry {
    pub payment_id: i64,
    pub month_number: i32,
    pub amount_paid: Decimal,
    pub status: PaymentStatus,
    pub payment_date: i64,
    pub is_lifter: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberHistory {
    pub member_id: i64,
    pub member_type: MemberKind,
    pub payment_history: Vec<MemberHistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberContribution {
    pub total_paid: Decimal,
    pub total_received: Decimal,
    pub net_amount: Decimal,
    pub payment_count: usize,
}

/// Lift status of one month in the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleStatus {
    pub month_number: i32,
    pub lift_amount: Decimal,
    pub no_lift_amount: Decimal,
    pub is_lifted: bool,
    pub lifter_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizerInfo {
    pub name: String,
    pub phone: String,
}

/// `GET /api/dashboard/chit/{id}/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChitDashboard {
    pub chit_id: i64,
    pub title: String,
    pub organizer: OrganizerInfo,
    pub total_slots: i32,
    pub used_slots: i64,
    pub available_slots: i64,
    pub total_amount: Decimal,
    pub lift_amount: Decimal,
    pub start_date: NaiveDate,
    pub duration_months: i32,
    pub current_month: Option<i32>,
    pub current_month_summary: Option<PaymentSummary>,
    pub members: Vec<MemberEntry>,
    pub schedules: Vec<ScheduleStatus>,
}

/// One chit in the organizer overview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizerChitOverview {
    pub chit_id: i64,
    pub title: String,
    pub total_amount: Decimal,
    pub start_date: NaiveDate,
    pub duration_months: i32,
    pub current_month: Option<i32>,
    pub total_members: usize,
    pub pending_payments_count: usize,
    pub current_month_summary: Option<PaymentSummary>,
}

/// `GET /api/dashboard/organizer/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizerDashboard {
    pub total_chits: usize,
    pub chits: Vec<OrganizerChitOverview>,
}

/// `GET /api/dashboard/chit/{id}/current-month/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentMonthView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub current_month: Option<i32>,
    pub payment_summary: Option<PaymentSummary>,
}

/// `GET /api/dashboard/chit/{id}/monthly-report/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub chit_id: i64,
    pub title: String,
    pub total_months: i32,
    pub monthly_reports: Vec<PaymentSummary>,
}

/// Payer identity in month-level views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayerInfo {
    pub id: i64,
    #[serde(rename = "type")]
    pub member_type: MemberKind,
    pub name: String,
    pub phone: String,
    pub slots: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleAmounts {
    pub lift_amount: Decimal,
    pub no_lift_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPaymentEntry {
    pub payment_id: i64,
    pub member: PayerInfo,
    pub amount_paid: Decimal,
    pub status: PaymentStatus,
    pub payment_date: i64,
    pub is_lifter: bool,
}

/// `GET /api/dashboard/chit/{id}/monthly-status/?month_number=`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyStatus {
    pub month_number: i32,
    pub schedule: ScheduleAmounts,
    pub payments: Vec<MonthlyPaymentEntry>,
}

/// `?month_number=`, required where used
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MonthQuery {
    pub month_number: Option<i32>,
}

impl MonthQuery {
    pub fn required(&self) -> Result<i32, AppError> {
        self.month_number
            .ok_or_else(|| AppError::field("month_number", "This query parameter is required."))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReminder {
    pub payment_id: i64,
    pub member: PayerInfo,
    pub amount_due: Decimal,
    pub status: PaymentStatus,
    pub days_overdue: i64,
}

/// `GET /api/dashboard/chit/{id}/payment-reminders/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReminders {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub month_number: Option<i32>,
    pub total_pending: usize,
    pub reminders: Vec<PaymentReminder>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_current_month_keeps_null_fields() {
        let view = CurrentMonthView {
            message: Some("Chit has not started yet or has been completed".into()),
            current_month: None,
            payment_summary: None,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert!(json["current_month"].is_null());
        assert!(json["payment_summary"].is_null());
        assert!(json["message"].is_string());
    }

    #[test]
    fn summary_money_is_stringly_typed() {
        let summary = PaymentSummary {
            month_number: 1,
            lift_amount: Decimal::new(40000, 2),
            no_lift_amount: Decimal::from(100),
            total_expected: Decimal::from(400),
            total_collected: Decimal::from(300),
            balance: Decimal::from(100),
            paid_count: 3,
            pending_count: 1,
            late_count: 0,
            lifter: Some(LifterInfo {
                name: "Meena".into(),
                member_type: MemberKind::External,
            }),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["balance"], "100");
        assert_eq!(json["lift_amount"], "400.00");
        assert_eq!(json["lifter"]["type"], "external");
    }
}
