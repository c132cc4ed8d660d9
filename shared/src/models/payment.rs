//! Payment Model
//!
//! `amount_paid` is signed: positive amounts are contributions paid in,
//! negative amounts are the pool paid out to that month's lifter.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::member::{MemberKind, MemberRef};
use crate::error::{AppError, ErrorCode};

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Late,
}

impl PaymentStatus {
    /// Parse from database string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "late" => Some(Self::Late),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Late => "late",
        }
    }

    /// Pending and late payments are both outstanding
    pub fn is_outstanding(&self) -> bool {
        matches!(self, Self::Pending | Self::Late)
    }
}

/// Payment read model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub chit_schedule_id: i64,
    pub chit_id: i64,
    pub chit_title: String,
    pub month_number: i32,
    pub member: MemberRef,
    pub member_type: MemberKind,
    pub member_name: String,
    pub member_phone: String,
    pub amount_paid: Decimal,
    pub status: PaymentStatus,
    /// Epoch milliseconds
    pub payment_date: i64,
}

impl Payment {
    /// Negative amounts are payouts to the lifter
    pub fn is_lifter_payout(&self) -> bool {
        self.amount_paid.is_sign_negative() && !self.amount_paid.is_zero()
    }
}

/// Create payment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCreate {
    pub membership: Option<i64>,
    pub external_member: Option<i64>,
    pub chit_schedule: i64,
    pub amount_paid: Decimal,
    #[serde(default)]
    pub status: PaymentStatus,
}

impl PaymentCreate {
    /// The single paying member; both or neither set is a validation error
    pub fn member(&self) -> Result<MemberRef, AppError> {
        match (self.membership, self.external_member) {
            (Some(_), Some(_)) => Err(AppError::new(ErrorCode::DualPaymentMember).with_detail(
                "membership",
                "Payment cannot have both membership and external_member",
            )),
            (None, None) => Err(AppError::new(ErrorCode::MissingPaymentMember).with_detail(
                "membership",
                "Payment must have either membership or external_member",
            )),
            (Some(id), None) => Ok(MemberRef::Verified(id)),
            (None, Some(id)) => Ok(MemberRef::External(id)),
        }
    }
}

/// `PATCH /api/payments/{id}/update-status/`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaymentStatusUpdate {
    pub status: PaymentStatus,
}

/// Query for `by-chit` and `by-month` listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentFilter {
    pub chit_id: Option<i64>,
    pub month_number: Option<i32>,
}

/// One entry of a bulk status update; fields stay loose so bad entries can be
/// reported individually instead of failing the whole request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkPaymentEntry {
    pub payment_id: Option<i64>,
    pub status: Option<String>,
}

/// `POST /api/dashboard/chit/{id}/bulk-payment-update/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkPaymentUpdate {
    #[serde(default)]
    pub updates: Vec<BulkPaymentEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkPaymentError {
    pub payment_id: Option<i64>,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkPaymentResult {
    pub updated_count: usize,
    pub updated_payment_ids: Vec<i64>,
    pub errors: Vec<BulkPaymentError>,
}
