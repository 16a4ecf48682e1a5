//! Kitchen status and wait-time policies
//!
//! A restaurant is always in one of four operational states. The three
//! "open" states map to a wait-time policy (a fixed number of minutes or a
//! range); `STOP` carries the message the voice assistant reads instead.
//!
//! Settings are stored as a JSON object keyed by status name:
//!
//! ```json
//! {
//!   "CALM":   { "fixed": 15 },
//!   "NORMAL": { "min": 25, "max": 35 },
//!   "RUSH":   { "min": 45, "max": 60 },
//!   "STOP":   { "message": "..." }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Message read to callers when the kitchen is stopped and no custom
/// message is configured.
pub const DEFAULT_STOP_MESSAGE: &str =
    "Nous ne prenons plus de commandes pour le moment. Merci de rappeler plus tard.";

/// Operational state of the kitchen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KitchenStatus {
    Calm,
    Normal,
    Rush,
    Stop,
}

impl KitchenStatus {
    /// Parse from database string value
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "CALM" => Some(Self::Calm),
            "NORMAL" => Some(Self::Normal),
            "RUSH" => Some(Self::Rush),
            "STOP" => Some(Self::Stop),
            _ => None,
        }
    }

    /// Database string representation (also the settings key)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Calm => "CALM",
            Self::Normal => "NORMAL",
            Self::Rush => "RUSH",
            Self::Stop => "STOP",
        }
    }

    pub fn is_accepting_orders(&self) -> bool {
        !matches!(self, Self::Stop)
    }

    /// Built-in wait policy used when a status has no stored policy.
    /// `None` for `Stop`, which has no wait time.
    pub fn default_policy(&self) -> Option<WaitPolicy> {
        match self {
            Self::Calm => Some(WaitPolicy::Fixed { fixed: 15 }),
            Self::Normal => Some(WaitPolicy::Range { min: 25, max: 35 }),
            Self::Rush => Some(WaitPolicy::Range { min: 45, max: 60 }),
            Self::Stop => None,
        }
    }
}

/// Wait time for an open status: exactly one of the two shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WaitPolicy {
    Fixed { fixed: u32 },
    Range { min: u32, max: u32 },
}

impl fmt::Display for WaitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed { fixed } => write!(f, "{fixed} minutes"),
            Self::Range { min, max } => write!(f, "entre {min} et {max} minutes"),
        }
    }
}

/// Policy for the `STOP` status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Per-restaurant status settings.
///
/// Every key is optional: missing open-status policies fall back to
/// [`KitchenStatus::default_policy`], a missing stop message to
/// [`DEFAULT_STOP_MESSAGE`]. The same type doubles as a partial update,
/// see [`StatusSettings::merged_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSettings {
    #[serde(rename = "CALM", default, skip_serializing_if = "Option::is_none")]
    pub calm: Option<WaitPolicy>,
    #[serde(rename = "NORMAL", default, skip_serializing_if = "Option::is_none")]
    pub normal: Option<WaitPolicy>,
    #[serde(rename = "RUSH", default, skip_serializing_if = "Option::is_none")]
    pub rush: Option<WaitPolicy>,
    #[serde(rename = "STOP", default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopPolicy>,
}

/// Rejection reasons for an externally supplied settings payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("status settings must be a JSON object")]
    NotAnObject,
    #[error("unknown status key {0}")]
    UnknownKey(String),
    #[error("{0}: expected {{\"fixed\": minutes}} or {{\"min\": minutes, \"max\": minutes}}")]
    InvalidShape(String),
    #[error("{key}: {field} must be a non-negative integer")]
    InvalidMinutes { key: String, field: &'static str },
    #[error("{0}: min must not exceed max")]
    InvertedRange(String),
    #[error("STOP: expected {{\"message\": text}} with a non-empty message")]
    InvalidStopMessage,
}

/// What the voice assistant and the dashboard need to know right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KitchenContext {
    pub status: KitchenStatus,
    pub wait_time_phrase: String,
    pub is_accepting_orders: bool,
}

impl StatusSettings {
    /// The complete default settings object, written back on first read.
    pub fn defaults() -> Self {
        Self {
            calm: KitchenStatus::Calm.default_policy(),
            normal: KitchenStatus::Normal.default_policy(),
            rush: KitchenStatus::Rush.default_policy(),
            stop: Some(StopPolicy {
                message: Some(DEFAULT_STOP_MESSAGE.to_string()),
            }),
        }
    }

    /// Validate a raw settings update.
    ///
    /// Each open-status key must be exactly `{fixed}` or exactly
    /// `{min, max}`; `STOP` must be `{message}`. The first violation is
    /// reported and nothing is returned for partial use.
    pub fn from_update(value: &Value) -> Result<Self, SettingsError> {
        let obj = value.as_object().ok_or(SettingsError::NotAnObject)?;
        let mut settings = Self::default();

        for (key, entry) in obj {
            match key.as_str() {
                "CALM" => settings.calm = Some(parse_wait_policy(key, entry)?),
                "NORMAL" => settings.normal = Some(parse_wait_policy(key, entry)?),
                "RUSH" => settings.rush = Some(parse_wait_policy(key, entry)?),
                "STOP" => settings.stop = Some(parse_stop_policy(entry)?),
                other => return Err(SettingsError::UnknownKey(other.to_string())),
            }
        }

        Ok(settings)
    }

    /// Shallow merge: keys present in `update` replace ours, the rest is kept.
    pub fn merged_with(&self, update: &StatusSettings) -> StatusSettings {
        StatusSettings {
            calm: update.calm.or(self.calm),
            normal: update.normal.or(self.normal),
            rush: update.rush.or(self.rush),
            stop: update.stop.clone().or_else(|| self.stop.clone()),
        }
    }

    /// Stored policy for an open status, falling back to the built-in default.
    pub fn policy_for(&self, status: KitchenStatus) -> Option<WaitPolicy> {
        let stored = match status {
            KitchenStatus::Calm => self.calm,
            KitchenStatus::Normal => self.normal,
            KitchenStatus::Rush => self.rush,
            KitchenStatus::Stop => return None,
        };
        stored.or_else(|| status.default_policy())
    }

    pub fn stop_message(&self) -> &str {
        self.stop
            .as_ref()
            .and_then(|s| s.message.as_deref())
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_STOP_MESSAGE)
    }
}

/// Human-readable wait-time phrase for the given status.
pub fn phrase(status: KitchenStatus, settings: &StatusSettings) -> String {
    match settings.policy_for(status) {
        Some(policy) => policy.to_string(),
        None => settings.stop_message().to_string(),
    }
}

/// Full kitchen context: status, phrase and whether orders are accepted.
pub fn context(status: KitchenStatus, settings: &StatusSettings) -> KitchenContext {
    KitchenContext {
        status,
        wait_time_phrase: phrase(status, settings),
        is_accepting_orders: status.is_accepting_orders(),
    }
}

fn parse_wait_policy(key: &str, value: &Value) -> Result<WaitPolicy, SettingsError> {
    let obj = value
        .as_object()
        .ok_or_else(|| SettingsError::InvalidShape(key.to_string()))?;

    if has_exact_keys(obj, &["fixed"]) {
        let fixed = minutes(key, obj, "fixed")?;
        return Ok(WaitPolicy::Fixed { fixed });
    }

    if has_exact_keys(obj, &["max", "min"]) {
        let min = minutes(key, obj, "min")?;
        let max = minutes(key, obj, "max")?;
        if min > max {
            return Err(SettingsError::InvertedRange(key.to_string()));
        }
        return Ok(WaitPolicy::Range { min, max });
    }

    Err(SettingsError::InvalidShape(key.to_string()))
}

fn parse_stop_policy(value: &Value) -> Result<StopPolicy, SettingsError> {
    let obj = value.as_object().ok_or(SettingsError::InvalidStopMessage)?;
    if !has_exact_keys(obj, &["message"]) {
        return Err(SettingsError::InvalidStopMessage);
    }
    match obj.get("message").and_then(Value::as_str).map(str::trim) {
        Some(message) if !message.is_empty() => Ok(StopPolicy {
            message: Some(message.to_string()),
        }),
        _ => Err(SettingsError::InvalidStopMessage),
    }
}

fn has_exact_keys(obj: &Map<String, Value>, expected: &[&str]) -> bool {
    obj.len() == expected.len() && expected.iter().all(|k| obj.contains_key(*k))
}

fn minutes(key: &str, obj: &Map<String, Value>, field: &'static str) -> Result<u32, SettingsError> {
    obj.get(field)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| SettingsError::InvalidMinutes {
            key: key.to_string(),
            field,
        })
}
