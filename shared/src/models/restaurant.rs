//! Restaurant Model

use serde::{Deserialize, Serialize};

/// Restaurant lifecycle status, managed from the back-office
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestaurantStatus {
    /// Live, taking calls
    Active,
    /// Account created, menu and settings being configured
    Onboarding,
    /// Disabled by an administrator
    Suspended,
}

impl RestaurantStatus {
    /// Parse from database string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "onboarding" => Some(Self::Onboarding),
            "suspended" => Some(Self::Suspended),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Onboarding => "onboarding",
            Self::Suspended => "suspended",
        }
    }
}
