//! Menu hierarchy
//!
//! Category → item (product variation) → modifier group → option
//! (modifier on an ingredient). Field names serialize to the pricing JSON
//! consumed by the voice assistant; prices are major currency units.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuCategory {
    pub category: String,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub modifier_groups: Vec<MenuModifierGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuModifierGroup {
    /// Name of the ingredient category the group draws from
    pub category: String,
    pub min_select: i32,
    pub max_select: i32,
    pub options: Vec<MenuOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuOption {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_extra: Decimal,
    pub is_available: bool,
}
