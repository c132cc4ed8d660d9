//! Dashboard assembly

use chrono::NaiveDate;
use shared::models::{
    ChitDashboard, CurrentMonthView, MemberEntry, OrganizerChitOverview, OrganizerDashboard,
    OrganizerInfo, ScheduleStatus,
};

use super::{ChitLedger, SlotUsage, current_month, payment_summary};

const NO_ACTIVE_MONTH: &str = "Chit has not started yet or has been completed";

fn active_month(ledger: &ChitLedger, today: NaiveDate) -> Option<i32> {
    current_month(ledger.chit.start_date, ledger.chit.duration_months, today)
}

/// Verified and external members merged into one listing
pub fn member_listing(ledger: &ChitLedger) -> Vec<MemberEntry> {
    ledger
        .memberships
        .iter()
        .map(MemberEntry::from)
        .chain(ledger.external_members.iter().map(MemberEntry::from))
        .collect()
}

pub fn chit_dashboard(ledger: &ChitLedger, today: NaiveDate) -> ChitDashboard {
    let chit = &ledger.chit;
    let current_month = active_month(ledger, today);
    let usage = SlotUsage::of(ledger);

    let schedules = ledger
        .schedules
        .iter()
        .map(|s| ScheduleStatus {
            month_number: s.month_number,
            lift_amount: s.lift_amount,
            no_lift_amount: s.no_lift_amount,
            is_lifted: s.is_lifted(),
            lifter_name: s.lifter.and_then(|m| ledger.member_name(m)),
        })
        .collect();

    ChitDashboard {
        chit_id: chit.id,
        title: chit.title.clone(),
        organizer: OrganizerInfo {
            name: chit.organizer_name.clone(),
            phone: chit.organizer_phone.clone(),
        },
        total_slots: chit.total_slots,
        used_slots: usage.used_slots,
        available_slots: usage.available_slots,
        total_amount: chit.total_amount,
        lift_amount: chit.lift_amount,
        start_date: chit.start_date,
        duration_months: chit.duration_months,
        current_month,
        current_month_summary: current_month.and_then(|m| payment_summary(ledger, m).ok()),
        members: member_listing(ledger),
        schedules,
    }
}

pub fn current_month_view(ledger: &ChitLedger, today: NaiveDate) -> CurrentMonthView {
    match active_month(ledger, today) {
        Some(month) => CurrentMonthView {
            message: None,
            current_month: Some(month),
            payment_summary: payment_summary(ledger, month).ok(),
        },
        None => CurrentMonthView {
            message: Some(NO_ACTIVE_MONTH.to_string()),
            current_month: None,
            payment_summary: None,
        },
    }
}

/// Overview of every chit an organizer runs, newest first as given
pub fn organizer_overview(ledgers: &[ChitLedger], today: NaiveDate) -> OrganizerDashboard {
    let chits: Vec<OrganizerChitOverview> = ledgers
        .iter()
        .map(|ledger| {
            let current_month = active_month(ledger, today);
            OrganizerChitOverview {
                chit_id: ledger.chit.id,
                title: ledger.chit.title.clone(),
                total_amount: ledger.chit.total_amount,
                start_date: ledger.chit.start_date,
                duration_months: ledger.chit.duration_months,
                current_month,
                total_members: ledger.memberships.len() + ledger.external_members.len(),
                pending_payments_count: ledger
                    .payments
                    .iter()
                    .filter(|p| p.status.is_outstanding())
                    .count(),
                current_month_summary: current_month
                    .and_then(|m| payment_summary(ledger, m).ok()),
            }
        })
        .collect();

    OrganizerDashboard {
        total_chits: chits.len(),
        chits,
    }
}
