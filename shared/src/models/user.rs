//! User Model

use serde::{Deserialize, Serialize};

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Cross-restaurant administrative access
    Admin,
    /// Operator of a single restaurant
    Owner,
}

impl UserRole {
    /// Parse from database string value
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "ADMIN" => Some(Self::Admin),
            "OWNER" => Some(Self::Owner),
            _ => None,
        }
    }

    /// Database string representation
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Owner => "OWNER",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}
