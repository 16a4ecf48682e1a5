//! Unified error codes
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Restaurant errors
//! - 6xxx: Menu errors
//! - 9xxx: System errors

use serde::Serialize;
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility with the dashboard frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Too many requests from one client
    TooManyRequests = 6,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Password shorter than the minimum length
    PasswordTooShort = 1005,
    /// New password and confirmation differ
    PasswordMismatch = 1006,

    // ==================== 2xxx: Permission ====================
    /// Admin role required
    AdminRequired = 2002,
    /// Restaurant owner role required
    OwnerRequired = 2003,
    /// Password must be changed before any other access
    PasswordChangeRequired = 2004,

    // ==================== 3xxx: Restaurant ====================
    /// Restaurant not found
    RestaurantNotFound = 3001,
    /// Kitchen status settings payload rejected
    InvalidStatusSettings = 3002,
    /// Business hours payload rejected
    InvalidBusinessHours = 3003,
    /// Unknown restaurant or kitchen status value
    InvalidStatus = 3004,

    // ==================== 6xxx: Menu ====================
    /// Ingredient not found
    IngredientNotFound = 6001,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
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
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::TooManyRequests => "Too many requests, try again later",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Session has expired",
            ErrorCode::TokenInvalid => "Session token is invalid",
            ErrorCode::PasswordTooShort => "Password must be at least 8 characters",
            ErrorCode::PasswordMismatch => "Passwords do not match",

            // Permission
            ErrorCode::AdminRequired => "Administrator role is required",
            ErrorCode::OwnerRequired => "Restaurant owner role is required",
            ErrorCode::PasswordChangeRequired => "Password must be changed first",

            // Restaurant
            ErrorCode::RestaurantNotFound => "Restaurant not found",
            ErrorCode::InvalidStatusSettings => "Invalid kitchen status settings",
            ErrorCode::InvalidBusinessHours => "Invalid business hours",
            ErrorCode::InvalidStatus => "Invalid status value",

            // Menu
            ErrorCode::IngredientNotFound => "Ingredient not found",

            // System
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_keep_their_range() {
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::TooManyRequests.code(), 6);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::PasswordChangeRequired.code(), 2004);
        assert_eq!(ErrorCode::InvalidStatusSettings.code(), 3002);
        assert_eq!(ErrorCode::IngredientNotFound.code(), 6001);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::RestaurantNotFound).unwrap();
        assert_eq!(json, "3001");
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorCode::NotFound.to_string(), "E0003");
        assert_eq!(ErrorCode::InternalError.to_string(), "E9001");
    }
}
