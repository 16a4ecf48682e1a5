//! Unified error system
//!
//! This module provides the error handling shared by every service:
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ApiResponse`]: Error body returned to clients
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Restaurant errors
//! - 6xxx: Menu errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! // Create a simple error
//! let err = AppError::new(ErrorCode::RestaurantNotFound);
//!
//! // Create an error with custom message
//! let err = AppError::with_message(ErrorCode::InvalidStatusSettings, "RUSH: min must not exceed max");
//!
//! // Create an error with details
//! let err = AppError::validation("Missing required field")
//!     .with_detail("field", "ownerEmail");
//!
//! // Convert to API response
//! let response = ApiResponse::error(&err);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::ErrorCode;
pub use types::{ApiResponse, AppError};
