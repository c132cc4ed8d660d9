//! Chit Schedule Model (one row per chit month)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::member::{MemberKind, MemberRef};
use crate::util::double_option;

/// Monthly schedule row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChitSchedule {
    pub id: i64,
    pub chit_id: i64,
    pub month_number: i32,
    pub lift_amount: Decimal,
    pub no_lift_amount: Decimal,
    /// Member who lifts this month, if assigned
    pub lifter: Option<MemberRef>,
}

impl ChitSchedule {
    pub fn is_lifted(&self) -> bool {
        self.lifter.is_some()
    }
}

/// `PATCH /api/schedules/{id}/update-month/`
///
/// Lifter fields distinguish "absent" (unchanged) from `null` (cleared).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleMonthUpdate {
    pub no_lift_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    pub lifted_by_membership: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub lifted_by_external: Option<Option<i64>>,
}

/// `POST /api/schedules/{id}/assign-lifter/`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AssignLifterRequest {
    pub member_type: MemberKind,
    pub member_id: i64,
}

impl From<AssignLifterRequest> for MemberRef {
    fn from(req: AssignLifterRequest) -> Self {
        MemberRef::new(req.member_type, req.member_id)
    }
}

/// Filter for `GET /api/schedules/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleFilter {
    pub chit_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifter_serializes_as_tagged_reference() {
        let schedule = ChitSchedule {
            id: 1,
            chit_id: 1,
            month_number: 2,
            lift_amount: Decimal::new(900000, 2),
            no_lift_amount: Decimal::new(100000, 2),
            lifter: Some(MemberRef::Verified(8)),
        };
        let json = serde_json::to_value(&schedule).unwrap();
        assert_eq!(json["lifter"]["member_type"], "verified");
        assert_eq!(json["lifter"]["member_id"], 8);
        assert_eq!(json["no_lift_amount"], "1000.00");
        assert!(schedule.is_lifted());
    }

    #[test]
    fn month_update_distinguishes_cleared_lifter() {
        let update: ScheduleMonthUpdate =
            serde_json::from_str(r#"{"lifted_by_membership": null}"#).unwrap();
        assert_eq!(update.lifted_by_membership, Some(None));
        assert_eq!(update.lifted_by_external, None);
        assert!(update.no_lift_amount.is_none());
    }
}
