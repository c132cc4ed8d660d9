//! Member Model
//!
//! A chit participant is either a verified [`Membership`] (backed by a user
//! account) or an [`ExternalMember`] tracked by phone number only. Wherever a
//! single participant is referenced (lifter, payer) the reference is a
//! [`MemberRef`], which names exactly one of the two.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCode};

/// Display name used for external members registered without a name
pub const UNKNOWN_MEMBER_NAME: &str = "Unknown";

/// Kind of chit participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    /// Verified user holding a membership
    Verified,
    /// Unverified participant tracked by phone number
    External,
}

impl MemberKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::External => "external",
        }
    }
}

impl std::fmt::Display for MemberKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to exactly one chit participant.
///
/// Serialized as `{"member_type": "verified", "member_id": 12}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "member_type", content = "member_id", rename_all = "lowercase")]
pub enum MemberRef {
    /// Membership id
    Verified(i64),
    /// External member id
    External(i64),
}

impl MemberRef {
    pub fn new(kind: MemberKind, id: i64) -> Self {
        match kind {
            MemberKind::Verified => Self::Verified(id),
            MemberKind::External => Self::External(id),
        }
    }

    pub fn kind(&self) -> MemberKind {
        match self {
            Self::Verified(_) => MemberKind::Verified,
            Self::External(_) => MemberKind::External,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Self::Verified(id) | Self::External(id) => *id,
        }
    }

    /// Build from the two nullable foreign-key columns used in storage.
    ///
    /// Returns `Ok(None)` when neither is set and an error when both are.
    pub fn from_columns(
        membership_id: Option<i64>,
        external_id: Option<i64>,
    ) -> Result<Option<Self>, AppError> {
        match (membership_id, external_id) {
            (Some(_), Some(_)) => Err(AppError::with_message(
                ErrorCode::InvalidMemberType,
                "A member reference cannot be both verified and external",
            )),
            (Some(id), None) => Ok(Some(Self::Verified(id))),
            (None, Some(id)) => Ok(Some(Self::External(id))),
            (None, None) => Ok(None),
        }
    }

    /// Split into `(membership_id, external_member_id)` storage columns
    pub fn columns(&self) -> (Option<i64>, Option<i64>) {
        match self {
            Self::Verified(id) => (Some(*id), None),
            Self::External(id) => (None, Some(*id)),
        }
    }
}

/// Query parameters naming one member (`?member_id=&member_type=`).
///
/// Both are optional on the wire so that a missing or unknown value becomes
/// a structured error instead of an extractor rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberQuery {
    pub member_id: Option<i64>,
    pub member_type: Option<String>,
}

impl MemberQuery {
    pub fn member(&self) -> Result<MemberRef, AppError> {
        let member_id = self.member_id.ok_or_else(|| {
            let message = "member_id and member_type are required";
            AppError::with_message(ErrorCode::RequiredField, message)
                .with_detail("member_id", "This query parameter is required.")
        })?;
        let kind = match self.member_type.as_deref() {
            Some("verified") => MemberKind::Verified,
            Some("external") => MemberKind::External,
            Some(_) => return Err(AppError::new(ErrorCode::InvalidMemberType)),
            None => {
                return Err(AppError::with_message(
                    ErrorCode::RequiredField,
                    "member_id and member_type are required",
                )
                .with_detail("member_type", "This query parameter is required."));
            }
        };
        Ok(MemberRef::new(kind, member_id))
    }
}

/// Verified member of a chit (joined with the user's name and phone)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Membership {
    pub id: i64,
    pub chit_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub user_phone: String,
    pub slot_count: i32,
    pub is_organizer: bool,
    pub joined_at: i64,
}

/// Add a verified user to a chit by phone number
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipCreate {
    pub phone_number: String,
    #[serde(default = "default_slot_count")]
    pub slot_count: i32,
    #[serde(default)]
    pub is_organizer: bool,
}

/// Unverified member of a chit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ExternalMember {
    pub id: i64,
    pub chit_id: i64,
    pub phone_number: String,
    pub name: Option<String>,
    pub slot_count: i32,
    pub is_organizer: bool,
    pub joined_at: i64,
}

impl ExternalMember {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN_MEMBER_NAME)
    }
}

/// Create external member payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalMemberCreate {
    pub phone_number: String,
    pub name: Option<String>,
    #[serde(default = "default_slot_count")]
    pub slot_count: i32,
    #[serde(default)]
    pub is_organizer: bool,
}

/// Update external member payload (partial)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalMemberUpdate {
    pub phone_number: Option<String>,
    pub name: Option<String>,
    pub slot_count: Option<i32>,
    pub is_organizer: Option<bool>,
}

fn default_slot_count() -> i32 {
    1
}

/// One row of the unified member listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberEntry {
    pub id: i64,
    #[serde(rename = "type")]
    pub member_type: MemberKind,
    pub name: String,
    pub phone_number: String,
    pub slot_count: i32,
    pub is_organizer: bool,
    pub joined_at: i64,
}

impl From<&Membership> for MemberEntry {
    fn from(m: &Membership) -> Self {
        Self {
            id: m.id,
            member_type: MemberKind::Verified,
            name: m.user_name.clone(),
            phone_number: m.user_phone.clone(),
            slot_count: m.slot_count,
            is_organizer: m.is_organizer,
            joined_at: m.joined_at,
        }
    }
}

impl From<&ExternalMember> for MemberEntry {
    fn from(m: &ExternalMember) -> Self {
        Self {
            id: m.id,
            member_type: MemberKind::External,
            name: m.display_name().to_string(),
            phone_number: m.phone_number.clone(),
            slot_count: m.slot_count,
            is_organizer: m.is_organizer,
            joined_at: m.joined_at,
        }
    }
}

/// `GET /api/chits/{id}/members/` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChitMembers {
    pub verified_members: Vec<Membership>,
    pub external_members: Vec<ExternalMember>,
    pub total_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_ref_wire_shape() {
        let json = serde_json::to_value(MemberRef::External(4)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"member_type": "external", "member_id": 4})
        );

        let parsed: MemberRef =
            serde_json::from_str(r#"{"member_type":"verified","member_id":9}"#).unwrap();
        assert_eq!(parsed, MemberRef::Verified(9));
    }

    #[test]
    fn member_query_parsing() {
        let q = MemberQuery {
            member_id: Some(4),
            member_type: Some("external".into()),
        };
        assert_eq!(q.member().unwrap(), MemberRef::External(4));

        let bad_kind = MemberQuery {
            member_id: Some(4),
            member_type: Some("guest".into()),
        };
        assert_eq!(bad_kind.member().unwrap_err().code, ErrorCode::InvalidMemberType);

        let missing = MemberQuery::default();
        assert_eq!(missing.member().unwrap_err().code, ErrorCode::RequiredField);
    }

    #[test]
    fn member_ref_rejects_unknown_kind() {
        let parsed = serde_json::from_str::<MemberRef>(r#"{"member_type":"guest","member_id":1}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn from_columns_enforces_exclusivity() {
        assert_eq!(MemberRef::from_columns(None, None).unwrap(), None);
        assert_eq!(
            MemberRef::from_columns(Some(3), None).unwrap(),
            Some(MemberRef::Verified(3))
        );
        assert_eq!(
            MemberRef::from_columns(None, Some(5)).unwrap(),
            Some(MemberRef::External(5))
        );
        let err = MemberRef::from_columns(Some(3), Some(5)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidMemberType);
    }

    #[test]
    fn columns_round_trip_kind_and_id() {
        let r = MemberRef::new(MemberKind::External, 11);
        assert_eq!(r.kind(), MemberKind::External);
        assert_eq!(r.id(), 11);
        assert_eq!(r.columns(), (None, Some(11)));
    }

    #[test]
    fn external_member_defaults() {
        let create: ExternalMemberCreate =
            serde_json::from_str(r#"{"phone_number":"+911234567890"}"#).unwrap();
        assert_eq!(create.slot_count, 1);
        assert!(!create.is_organizer);
        assert!(create.name.is_none());
    }

    #[test]
    fn unnamed_external_member_lists_as_unknown() {
        let m = ExternalMember {
            id: 2,
            chit_id: 1,
            phone_number: "+911112223334".into(),
            name: None,
            slot_count: 2,
            is_organizer: false,
            joined_at: 0,
        };
        let entry = MemberEntry::from(&m);
        assert_eq!(entry.name, "Unknown");
        assert_eq!(entry.member_type, MemberKind::External);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "external");
    }
}
