//! Shared types for the Resto platform
//!
//! Domain types used by the cloud service: the unified error system,
//! user roles, restaurant and kitchen status, business hours and the
//! menu hierarchy.

pub mod error;
pub mod models;
pub mod util;
