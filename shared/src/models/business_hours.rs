//! Business hours schedule
//!
//! Stored as JSON keyed by lowercase weekday, each day a list of opening
//! slots:
//!
//! ```json
//! { "monday": [{ "open": "11:30", "close": "14:30" }, { "open": "18:30", "close": "22:00" }] }
//! ```
//!
//! Days without an entry are closed. A slot whose closing time is earlier
//! than its opening time runs past midnight (`"18:30"` to `"00:30"`) and
//! belongs to the day it opens.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

const TIME_FORMAT: &str = "%H:%M";
const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "monday" => Some(Self::Monday),
            "tuesday" => Some(Self::Tuesday),
            "wednesday" => Some(Self::Wednesday),
            "thursday" => Some(Self::Thursday),
            "friday" => Some(Self::Friday),
            "saturday" => Some(Self::Saturday),
            "sunday" => Some(Self::Sunday),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningSlot {
    pub open: String,
    pub close: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessHours(pub BTreeMap<Weekday, Vec<OpeningSlot>>);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HoursError {
    #[error("business hours must be a JSON object keyed by weekday")]
    NotAnObject,
    #[error("unknown weekday {0}")]
    UnknownDay(String),
    #[error("{0}: expected a list of opening slots")]
    NotAList(String),
    #[error("{day}[{index}]: {field} must be a time formatted HH:MM")]
    InvalidTime {
        day: String,
        index: usize,
        field: &'static str,
    },
    #[error("{day}[{index}]: opening and closing times must differ")]
    EmptySlot { day: String, index: usize },
    #[error("{0}: opening slots overlap")]
    Overlap(String),
}

impl BusinessHours {
    /// Validate a raw schedule, reporting the first violation.
    pub fn from_value(value: &Value) -> Result<Self, HoursError> {
        let obj = value.as_object().ok_or(HoursError::NotAnObject)?;
        let mut days = BTreeMap::new();

        for (day_name, slots) in obj {
            let day =
                Weekday::parse(day_name).ok_or_else(|| HoursError::UnknownDay(day_name.clone()))?;
            let list = slots
                .as_array()
                .ok_or_else(|| HoursError::NotAList(day_name.clone()))?;

            let mut parsed = Vec::with_capacity(list.len());
            let mut ranges = Vec::with_capacity(list.len());
            for (index, slot) in list.iter().enumerate() {
                let open = slot_time(day_name, index, slot, "open")?;
                let close = slot_time(day_name, index, slot, "close")?;
                if open == close {
                    return Err(HoursError::EmptySlot {
                        day: day_name.clone(),
                        index,
                    });
                }
                ranges.push(minutes_range(open, close));
                parsed.push(OpeningSlot {
                    open: open.format(TIME_FORMAT).to_string(),
                    close: close.format(TIME_FORMAT).to_string(),
                });
            }

            ranges.sort();
            if ranges.windows(2).any(|w| w[1].0 < w[0].1) {
                return Err(HoursError::Overlap(day_name.clone()));
            }

            days.insert(day, parsed);
        }

        Ok(Self(days))
    }
}

/// Minutes since the opening day's midnight; overnight slots end past 24:00.
fn minutes_range(open: NaiveTime, close: NaiveTime) -> (u32, u32) {
    let open_min = open.num_seconds_from_midnight() / 60;
    let mut close_min = close.num_seconds_from_midnight() / 60;
    if close < open {
        close_min += MINUTES_PER_DAY;
    }
    (open_min, close_min)
}

fn slot_time(
    day: &str,
    index: usize,
    slot: &Value,
    field: &'static str,
) -> Result<NaiveTime, HoursError> {
    slot.get(field)
        .and_then(Value::as_str)
        .and_then(|s| NaiveTime::parse_from_str(s, TIME_FORMAT).ok())
        .ok_or_else(|| HoursError::InvalidTime {
            day: day.to_string(),
            index,
            field,
        })
}
