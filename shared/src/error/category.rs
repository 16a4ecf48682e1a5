//! Error category classification

use super::codes::ErrorCode;

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Authentication errors
/// - 2xxx: Permission errors
/// - 3xxx: Restaurant errors
/// - 6xxx: Menu errors
/// - 9xxx: System errors (and any unassigned range)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Permission errors (2xxx)
    Permission,
    /// Restaurant errors (3xxx)
    Restaurant,
    /// Menu errors (6xxx)
    Menu,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            2000..3000 => Self::Permission,
            3000..4000 => Self::Restaurant,
            6000..7000 => Self::Menu,
            _ => Self::System,
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1001), ErrorCategory::Auth);
        assert_eq!(ErrorCategory::from_code(2001), ErrorCategory::Permission);
        assert_eq!(ErrorCategory::from_code(3001), ErrorCategory::Restaurant);
        assert_eq!(ErrorCategory::from_code(6001), ErrorCategory::Menu);
        assert_eq!(ErrorCategory::from_code(9001), ErrorCategory::System);
        assert_eq!(ErrorCategory::from_code(4001), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::NotAuthenticated.category(), ErrorCategory::Auth);
        assert_eq!(
            ErrorCode::AdminRequired.category(),
            ErrorCategory::Permission
        );
        assert_eq!(
            ErrorCode::RestaurantNotFound.category(),
            ErrorCategory::Restaurant
        );
        assert_eq!(
            ErrorCode::IngredientNotFound.category(),
            ErrorCategory::Menu
        );
        assert_eq!(ErrorCode::InternalError.category(), ErrorCategory::System);
    }

}
