//! Unified error codes for the chit ledger
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 3xxx: Chit errors
//! - 4xxx: Schedule errors
//! - 5xxx: Payment errors
//! - 6xxx: Member errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so that clients can switch
/// on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field is missing
    RequiredField = 7,

    // ==================== 1xxx: Auth ====================
    /// Caller is not authenticated
    NotAuthenticated = 1001,
    /// Phone number or password is wrong
    InvalidCredentials = 1002,
    /// Access token has expired
    TokenExpired = 1003,
    /// Access token is malformed or has a bad signature
    TokenInvalid = 1004,
    /// Refresh token is unknown, revoked or expired
    SessionExpired = 1005,
    /// Account is disabled
    AccountDisabled = 1006,
    /// Identity provider rejected the phone-ownership token
    IdentityTokenInvalid = 1007,
    /// Identity token carries no phone number
    PhoneNumberMissing = 1008,
    /// Identity token phone number differs from the submitted one
    PhoneNumberMismatch = 1009,
    /// Password is shorter than the minimum length
    PasswordTooShort = 1010,
    /// A user with this phone number already exists
    UserAlreadyExists = 1011,
    /// User not found
    UserNotFound = 1012,
    /// Too many requests from this client
    TooManyRequests = 1013,

    // ==================== 3xxx: Chit ====================
    /// Chit not found
    ChitNotFound = 3001,
    /// Requested slots exceed the chit's remaining capacity
    SlotCapacityExceeded = 3002,
    /// Slot count must be at least one
    InvalidSlotCount = 3003,
    /// Duration must be at least one month
    InvalidDuration = 3004,
    /// Monetary amount is out of range
    InvalidAmount = 3005,
    /// Trailing months still carry lifters or payments
    DurationShrinkBlocked = 3006,

    // ==================== 4xxx: Schedule ====================
    /// Schedule not found
    ScheduleNotFound = 4001,
    /// Member has already lifted in this chit
    LifterAlreadyAssigned = 4002,
    /// member_type is neither "verified" nor "external"
    InvalidMemberType = 4003,
    /// Both a verified and an external lifter were given
    DualLifterAssignment = 4004,

    // ==================== 5xxx: Payment ====================
    /// Payment not found
    PaymentNotFound = 5001,
    /// Payment status is not one of pending/paid/late
    InvalidPaymentStatus = 5002,
    /// Payment names both a verified and an external member
    DualPaymentMember = 5003,
    /// Payment names no member
    MissingPaymentMember = 5004,
    /// Payment for this member and month already exists
    PaymentAlreadyExists = 5005,

    // ==================== 6xxx: Member ====================
    /// Membership not found
    MembershipNotFound = 6002,
    /// External member not found
    ExternalMemberNotFound = 6003,
    /// User is already a member of this chit
    MembershipAlreadyExists = 6004,
    /// Member still has payment records
    MemberHasPayments = 6005,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Identity provider could not be reached
    IdentityProviderUnavailable = 9006,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid credentials",
            ErrorCode::TokenExpired => "Token has expired",
            ErrorCode::TokenInvalid => "Invalid token",
            ErrorCode::SessionExpired => "Session has expired",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::IdentityTokenInvalid => "Invalid identity token",
            ErrorCode::PhoneNumberMissing => "Phone number not found in token",
            ErrorCode::PhoneNumberMismatch => "Phone number mismatch with token",
            ErrorCode::PasswordTooShort => "Password is too short",
            ErrorCode::UserAlreadyExists => "User with this phone number already exists",
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::TooManyRequests => "Too many requests, try again later",

            // Chit
            ErrorCode::ChitNotFound => "Chit not found",
            ErrorCode::SlotCapacityExceeded => "Not enough available slots",
            ErrorCode::InvalidSlotCount => "Slot count must be at least 1",
            ErrorCode::InvalidDuration => "Duration must be at least 1 month",
            ErrorCode::InvalidAmount => "Invalid amount",
            ErrorCode::DurationShrinkBlocked => {
                "Cannot remove months that have lifters or payments"
            }

            // Schedule
            ErrorCode::ScheduleNotFound => "Schedule not found",
            ErrorCode::LifterAlreadyAssigned => "Member has already lifted in this chit",
            ErrorCode::InvalidMemberType => {
                "Invalid member_type. Use 'verified' or 'external'"
            }
            ErrorCode::DualLifterAssignment => {
                "Cannot assign both verified member and external member as lifter"
            }

            // Payment
            ErrorCode::PaymentNotFound => "Payment not found",
            ErrorCode::InvalidPaymentStatus => {
                "Invalid status. Use 'paid', 'pending', or 'late'"
            }
            ErrorCode::DualPaymentMember => {
                "Cannot assign payment to both verified and external member"
            }
            ErrorCode::MissingPaymentMember => {
                "Must assign payment to either verified or external member"
            }
            ErrorCode::PaymentAlreadyExists => "Payment for this member and month already exists",

            // Member
            ErrorCode::MembershipNotFound => "Membership not found",
            ErrorCode::ExternalMemberNotFound => "External member not found",
            ErrorCode::MembershipAlreadyExists => "User is already a member of this chit",
            ErrorCode::MemberHasPayments => "Cannot remove member with existing payments",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::IdentityProviderUnavailable => "Identity provider unavailable",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::SessionExpired),
            1006 => Ok(ErrorCode::AccountDisabled),
            1007 => Ok(ErrorCode::IdentityTokenInvalid),
            1008 => Ok(ErrorCode::PhoneNumberMissing),
            1009 => Ok(ErrorCode::PhoneNumberMismatch),
            1010 => Ok(ErrorCode::PasswordTooShort),
            1011 => Ok(ErrorCode::UserAlreadyExists),
            1012 => Ok(ErrorCode::UserNotFound),
            1013 => Ok(ErrorCode::TooManyRequests),

            // Chit
            3001 => Ok(ErrorCode::ChitNotFound),
            3002 => Ok(ErrorCode::SlotCapacityExceeded),
            3003 => Ok(ErrorCode::InvalidSlotCount),
            3004 => Ok(ErrorCode::InvalidDuration),
            3005 => Ok(ErrorCode::InvalidAmount),
            3006 => Ok(ErrorCode::DurationShrinkBlocked),

            // Schedule
            4001 => Ok(ErrorCode::ScheduleNotFound),
            4002 => Ok(ErrorCode::LifterAlreadyAssigned),
            4003 => Ok(ErrorCode::InvalidMemberType),
            4004 => Ok(ErrorCode::DualLifterAssignment),

            // Payment
            5001 => Ok(ErrorCode::PaymentNotFound),
            5002 => Ok(ErrorCode::InvalidPaymentStatus),
            5003 => Ok(ErrorCode::DualPaymentMember),
            5004 => Ok(ErrorCode::MissingPaymentMember),
            5005 => Ok(ErrorCode::PaymentAlreadyExists),

            // Member
            6002 => Ok(ErrorCode::MembershipNotFound),
            6003 => Ok(ErrorCode::ExternalMemberNotFound),
            6004 => Ok(ErrorCode::MembershipAlreadyExists),
            6005 => Ok(ErrorCode::MemberHasPayments),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9006 => Ok(ErrorCode::IdentityProviderUnavailable),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
