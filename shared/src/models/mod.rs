//! Domain models

pub mod business_hours;
pub mod kitchen;
pub mod menu;
pub mod restaurant;
pub mod user;

pub use business_hours::{BusinessHours, HoursError, OpeningSlot, Weekday};
pub use kitchen::{
    KitchenContext, KitchenStatus, SettingsError, StatusSettings, StopPolicy, WaitPolicy,
};
pub use menu::{MenuCategory, MenuItem, MenuModifierGroup, MenuOption};
pub use restaurant::RestaurantStatus;
pub use user::UserRole;
