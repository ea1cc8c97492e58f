//! Unified error codes for the subscription service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 3xxx: User errors
//! - 4xxx: Plan errors
//! - 5xxx: Subscription errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Malformed identifier
    InvalidId = 7,
    /// Update request carried no fields
    NothingToUpdate = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled (soft-deleted user)
    AccountDisabled = 1005,
    /// Current password does not match
    WrongPassword = 1006,

    // ==================== 3xxx: User ====================
    /// User not found
    UserNotFound = 3001,
    /// Email already registered
    EmailAlreadyRegistered = 3002,
    /// User is inactive
    UserInactive = 3003,

    // ==================== 4xxx: Plan ====================
    /// Plan not found
    PlanNotFound = 4001,
    /// Plan is inactive
    PlanInactive = 4002,
    /// Plan still has active subscriptions
    PlanInUse = 4003,

    // ==================== 5xxx: Subscription ====================
    /// Subscription not found
    SubscriptionNotFound = 5001,
    /// User already has an active subscription
    AlreadySubscribed = 5002,
    /// Date is not a YYYY-MM-DD calendar date
    InvalidDateFormat = 5003,
    /// State is not one of active/expired/cancelled
    InvalidState = 5004,
    /// Subscription is cancelled and cannot change state
    SubscriptionCancelled = 5005,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Operation timed out
    TimeoutError = 9004,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidId => "Invalid identifier",
            ErrorCode::NothingToUpdate => "No fields to update",

            // Auth
            ErrorCode::NotAuthenticated => "Authorization token required",
            ErrorCode::InvalidCredentials => "Invalid credentials",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDisabled => "User is inactive",
            ErrorCode::WrongPassword => "Current password is incorrect",

            // User
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::EmailAlreadyRegistered => "Email is already registered",
            ErrorCode::UserInactive => "User is inactive",

            // Plan
            ErrorCode::PlanNotFound => "Plan not found",
            ErrorCode::PlanInactive => "Plan is inactive",
            ErrorCode::PlanInUse => "Cannot delete a plan with active subscriptions",

            // Subscription
            ErrorCode::SubscriptionNotFound => "Subscription not found",
            ErrorCode::AlreadySubscribed => "User already has an active subscription",
            ErrorCode::InvalidDateFormat => "Invalid date format (use YYYY-MM-DD)",
            ErrorCode::InvalidState => "Invalid state (use active, expired or cancelled)",
            ErrorCode::SubscriptionCancelled => "Subscription is cancelled",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::TimeoutError => "Operation timed out",
        }
    }

    /// Short machine-readable name, used as the `error` field of the envelope
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Success => "success",
            ErrorCode::ValidationFailed => "validation_failed",
            ErrorCode::NotFound => "not_found",
            ErrorCode::AlreadyExists => "already_exists",
            ErrorCode::InvalidRequest => "invalid_request",
            ErrorCode::InvalidId => "invalid_id",
            ErrorCode::NothingToUpdate => "nothing_to_update",
            ErrorCode::NotAuthenticated => "missing_token",
            ErrorCode::InvalidCredentials => "invalid_credentials",
            ErrorCode::TokenExpired => "token_expired",
            ErrorCode::TokenInvalid => "invalid_token",
            ErrorCode::AccountDisabled => "inactive_user",
            ErrorCode::WrongPassword => "wrong_password",
            ErrorCode::UserNotFound => "user_not_found",
            ErrorCode::EmailAlreadyRegistered => "duplicate_email",
            ErrorCode::UserInactive => "user_inactive",
            ErrorCode::PlanNotFound => "plan_not_found",
            ErrorCode::PlanInactive => "plan_inactive",
            ErrorCode::PlanInUse => "plan_in_use",
            ErrorCode::SubscriptionNotFound => "subscription_not_found",
            ErrorCode::AlreadySubscribed => "already_subscribed",
            ErrorCode::InvalidDateFormat => "invalid_date_format",
            ErrorCode::InvalidState => "invalid_state",
            ErrorCode::SubscriptionCancelled => "subscription_cancelled",
            ErrorCode::InternalError => "internal_error",
            ErrorCode::TimeoutError => "timeout",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            7 => Ok(ErrorCode::InvalidId),
            8 => Ok(ErrorCode::NothingToUpdate),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::AccountDisabled),
            1006 => Ok(ErrorCode::WrongPassword),

            // User
            3001 => Ok(ErrorCode::UserNotFound),
            3002 => Ok(ErrorCode::EmailAlreadyRegistered),
            3003 => Ok(ErrorCode::UserInactive),

            // Plan
            4001 => Ok(ErrorCode::PlanNotFound),
            4002 => Ok(ErrorCode::PlanInactive),
            4003 => Ok(ErrorCode::PlanInUse),

            // Subscription
            5001 => Ok(ErrorCode::SubscriptionNotFound),
            5002 => Ok(ErrorCode::AlreadySubscribed),
            5003 => Ok(ErrorCode::InvalidDateFormat),
            5004 => Ok(ErrorCode::InvalidState),
            5005 => Ok(ErrorCode::SubscriptionCancelled),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9004 => Ok(ErrorCode::TimeoutError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::InvalidId.code(), 7);

        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::InvalidCredentials.code(), 1002);
        assert_eq!(ErrorCode::AccountDisabled.code(), 1005);

        assert_eq!(ErrorCode::EmailAlreadyRegistered.code(), 3002);
        assert_eq!(ErrorCode::PlanInUse.code(), 4003);
        assert_eq!(ErrorCode::AlreadySubscribed.code(), 5002);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
        assert_eq!(ErrorCode::TimeoutError.code(), 9004);
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(0), Ok(ErrorCode::Success));
        assert_eq!(ErrorCode::try_from(4003), Ok(ErrorCode::PlanInUse));
        assert_eq!(
            ErrorCode::try_from(5005),
            Ok(ErrorCode::SubscriptionCancelled)
        );
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(2001), Err(InvalidErrorCode(2001)));
        assert_eq!(ErrorCode::try_from(9002), Err(InvalidErrorCode(9002)));
        assert_eq!(ErrorCode::try_from(65535), Err(InvalidErrorCode(65535)));
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&ErrorCode::AlreadySubscribed).unwrap();
        assert_eq!(json, "5002");
    }

    #[test]
    fn test_deserialize_invalid() {
        let result: Result<ErrorCode, _> = serde_json::from_str("7777");
        assert!(result.is_err());
    }

    #[test]
    fn test_as_str() {
        assert_eq!(ErrorCode::NotAuthenticated.as_str(), "missing_token");
        assert_eq!(ErrorCode::EmailAlreadyRegistered.as_str(), "duplicate_email");
        assert_eq!(ErrorCode::PlanInUse.as_str(), "plan_in_use");
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ErrorCode::PlanNotFound), "4001");
        assert_eq!(
            format!("{}", InvalidErrorCode(42)),
            "Invalid error code: 42"
        );
    }
}
