//! Database access layer

pub mod audit;
pub mod menu;
pub mod restaurants;
pub mod users;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;
