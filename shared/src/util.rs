use rust_decimal::Decimal;

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Convert an integer amount in minor units (cents) to major units.
///
/// Prices are stored as integers everywhere and only divided at the
/// presentation boundary.
pub fn minor_to_major(minor: i64) -> Decimal {
    Decimal::new(minor, 2).normalize()
}
