//! Settlement engine
//!
//! Pure functions over a [`ChitLedger`] snapshot: month numbering, slot
//! accounting, payment summaries, payment-expectation planning, lift
//! eligibility, completion validation and dashboard assembly.
//!
//! Nothing in here touches the database. The `db` layer loads a snapshot,
//! hands it to these functions and persists whatever they decide, so every
//! rule can be tested with plain in-memory fixtures.
//!
//! All money is `rust_decimal::Decimal`; no floats are involved anywhere.

mod bulk;
mod completion;
mod dashboard;
mod eligibility;
mod expectations;
mod month;
mod reports;
mod slots;
mod summary;


pub use bulk::plan_bulk_update;
pub use completion::validate_completion;
pub use dashboard::{chit_dashboard, current_month_view, member_listing, organizer_overview};
pub use eligibility::{check_eligibility, ensure_can_lift};
pub use expectations::{ExpectedPayment, default_no_lift_amount, expected_payments};
pub use month::current_month;
pub use reports::{member_contribution, member_history, monthly_status, payment_reminders};
pub use slots::{SlotUsage, ensure_capacity};
pub use summary::{monthly_report, payment_summary};

use shared::models::{
    Chit, ChitSchedule, ExternalMember, MemberKind, MemberRef, Membership, Payment, PayerInfo,
};

/// Everything the engine needs to know about one chit
#[derive(Debug, Clone)]
pub struct ChitLedger {
    pub chit: Chit,
    pub memberships: Vec<Membership>,
    pub external_members: Vec<ExternalMember>,
    /// Ordered by month number
    pub schedules: Vec<ChitSchedule>,
    pub payments: Vec<Payment>,
}

impl ChitLedger {
    pub fn schedule_for_month(&self, month_number: i32) -> Option<&ChitSchedule> {
        self.schedules
            .iter()
            .find(|s| s.month_number == month_number)
    }

    pub fn payments_for_schedule(&self, schedule_id: i64) -> impl Iterator<Item = &Payment> {
        self.payments
            .iter()
            .filter(move |p| p.chit_schedule_id == schedule_id)
    }

    pub fn payments_of(&self, member: MemberRef) -> impl Iterator<Item = &Payment> {
        self.payments.iter().filter(move |p| p.member == member)
    }

    pub fn membership(&self, id: i64) -> Option<&Membership> {
        self.memberships.iter().find(|m| m.id == id)
    }

    pub fn external_member(&self, id: i64) -> Option<&ExternalMember> {
        self.external_members.iter().find(|m| m.id == id)
    }

    pub fn contains_member(&self, member: MemberRef) -> bool {
        self.payer_info(member).is_some()
    }

    /// Display name of a participant of this chit
    pub fn member_name(&self, member: MemberRef) -> Option<String> {
        self.payer_info(member).map(|p| p.name)
    }

    /// Identity and slot count of a participant of this chit
    pub fn payer_info(&self, member: MemberRef) -> Option<PayerInfo> {
        match member {
            MemberRef::Verified(id) => self.membership(id).map(|m| PayerInfo {
                id: m.id,
                member_type: MemberKind::Verified,
                name: m.user_name.clone(),
                phone: m.user_phone.clone(),
                slots: m.slot_count,
            }),
            MemberRef::External(id) => self.external_member(id).map(|m| PayerInfo {
                id: m.id,
                member_type: MemberKind::External,
                name: m.display_name().to_string(),
                phone: m.phone_number.clone(),
                slots: m.slot_count,
            }),
        }
    }

    /// Every participant with its slot count, verified members first
    pub fn participants(&self) -> impl Iterator<Item = (MemberRef, i32)> + '_ {
        let verified = self
            .memberships
            .iter()
            .map(|m| (MemberRef::Verified(m.id), m.slot_count));
        let external = self
            .external_members
            .iter()
            .map(|m| (MemberRef::External(m.id), m.slot_count));
        verified.chain(external)
    }
}
