//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // 404 Not Found
            Self::NotFound | Self::RestaurantNotFound | Self::IngredientNotFound => {
                StatusCode::NOT_FOUND
            }

            // 409 Conflict
            Self::AlreadyExists => StatusCode::CONFLICT,

            // 429 Too Many Requests
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::AdminRequired | Self::OwnerRequired | Self::PasswordChangeRequired => {
                StatusCode::FORBIDDEN
            }

            // 500 Internal Server Error
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
