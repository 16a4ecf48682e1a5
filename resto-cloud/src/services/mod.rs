//! Business logic shared by several handlers

pub mod kitchen;
pub mod menu;
