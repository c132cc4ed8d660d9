//! Chit Model

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::member::{ExternalMember, ExternalMemberCreate, Membership};
use super::schedule::ChitSchedule;

/// Chit entity (one fund round), joined with its organizer's name and phone
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Chit {
    pub id: i64,
    pub organizer_id: i64,
    pub organizer_name: String,
    pub organizer_phone: String,
    pub title: String,
    pub total_slots: i32,
    pub total_amount: Decimal,
    pub lift_amount: Decimal,
    pub start_date: NaiveDate,
    pub duration_months: i32,
    pub created_at: i64,
}

/// Chit list item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ChitSummary {
    #[serde(flatten)]
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub chit: Chit,
    pub member_count: i64,
}

/// Chit detail with members and schedules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChitDetail {
    #[serde(flatten)]
    pub chit: Chit,
    pub used_slots: i64,
    pub available_slots: i64,
    pub memberships: Vec<Membership>,
    pub external_members: Vec<ExternalMember>,
    pub schedules: Vec<ChitSchedule>,
}

/// Create chit payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChitCreate {
    pub title: String,
    pub total_slots: i32,
    pub total_amount: Decimal,
    pub lift_amount: Decimal,
    pub start_date: NaiveDate,
    pub duration_months: i32,
    #[serde(default)]
    pub external_members_data: Vec<ExternalMemberCreate>,
}

/// Update chit payload (partial)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChitUpdate {
    pub title: Option<String>,
    pub total_slots: Option<i32>,
    pub total_amount: Option<Decimal>,
    pub lift_amount: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub duration_months: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_accept_strings_and_numbers() {
        let create: ChitCreate = serde_json::from_str(
            r#"{
                "title": "Family pool",
                "total_slots": 10,
                "total_amount": "100000.00",
                "lift_amount": 90000,
                "start_date": "2025-01-15",
                "duration_months": 10
            }"#,
        )
        .unwrap();
        assert_eq!(create.total_amount, Decimal::new(10_000_000, 2));
        assert_eq!(create.lift_amount, Decimal::from(90_000));
        assert!(create.external_members_data.is_empty());
    }

    #[test]
    fn amounts_serialize_as_decimal_strings() {
        let chit = Chit {
            id: 1,
            organizer_id: 2,
            organizer_name: "Ravi".into(),
            organizer_phone: "+919000000000".into(),
            title: "Office pool".into(),
            total_slots: 5,
            total_amount: Decimal::new(5000000, 2),
            lift_amount: Decimal::new(4500000, 2),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            duration_months: 5,
            created_at: 0,
        };
        let json = serde_json::to_value(ChitSummary {
            chit,
            member_count: 3,
        })
        .unwrap();
        assert_eq!(json["total_amount"], "50000.00");
        assert_eq!(json["lift_amount"], "45000.00");
        assert_eq!(json["start_date"], "2025-03-01");
        assert_eq!(json["member_count"], 3);
        assert_eq!(json["organizer_name"], "Ravi");
    }
}
