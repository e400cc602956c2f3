use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyInfo {
    pub key: String,
    pub created_at: DateTime<Utc>,
    /// `None` until the key is used; the TTL clock starts at first use.
    #[serde(default)]
    pub first_used_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub ttl_hours: i64,
    #[serde(default = "enabled_by_default")]
    pub is_enabled: bool,
    #[serde(default)]
    pub description: String,
}

fn enabled_by_default() -> bool { true }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    Disabled,
    /// Never used, so not counting down yet.
    Unused,
    Expired,
    Active,
}

impl KeyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStatus::Disabled => "disabled",
            KeyStatus::Unused => "unused",
            KeyStatus::Expired => "expired",
            KeyStatus::Active => "active",
        }
    }
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Coarsest non-zero unit of the time left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemainingTime {
    Expired,
    Days(i64),
    Hours(i64),
    Minutes(i64),
}

impl fmt::Display for RemainingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemainingTime::Expired => write!(f, "expired"),
            RemainingTime::Days(d) => write!(f, "{} days left", d),
            RemainingTime::Hours(h) => write!(f, "{} hours left", h),
            RemainingTime::Minutes(m) => write!(f, "{} minutes left", m),
        }
    }
}

pub fn remaining_time(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> RemainingTime {
    let left = expires_at - now;
    if left < Duration::zero() {
        return RemainingTime::Expired;
    }
    if left.num_days() > 0 {
        RemainingTime::Days(left.num_days())
    } else if left.num_hours() > 0 {
        RemainingTime::Hours(left.num_hours())
    } else {
        RemainingTime::Minutes(left.num_minutes())
    }
}

/// Long keys shown as first ten, `...`, last ten characters.
pub fn format_key_display(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 20 {
        return key.to_string();
    }
    let head: String = chars[..10].iter().collect();
    let tail: String = chars[chars.len() - 10..].iter().collect();
    format!("{}...{}", head, tail)
}

impl ApiKeyInfo {
    pub fn status_at(&self, now: DateTime<Utc>) -> KeyStatus {
        if !self.is_enabled {
            KeyStatus::Disabled
        } else if self.first_used_at.is_none() {
            KeyStatus::Unused
        } else if self.expires_at < now {
            KeyStatus::Expired
        } else {
            KeyStatus::Active
        }
    }

    pub fn remaining_at(&self, now: DateTime<Utc>) -> RemainingTime { remaining_time(self.expires_at, now) }

    pub fn display_key(&self) -> String { format_key_display(&self.key) }
}

/// Per-status totals for the key list header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KeyStats {
    pub total: usize,
    pub active: usize,
    pub unused: usize,
    pub expired: usize,
    pub disabled: usize,
}

pub fn key_stats(keys: &[ApiKeyInfo], now: DateTime<Utc>) -> KeyStats {
    keys.iter().fold(KeyStats { total: keys.len(), ..Default::default() }, |mut s, k| {
        match k.status_at(now) {
            KeyStatus::Active => s.active += 1,
            KeyStatus::Unused => s.unused += 1,
            KeyStatus::Expired => s.expired += 1,
            KeyStatus::Disabled => s.disabled += 1,
        }
        s
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateKeyRequest {
    pub ttl_hours: i64,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateKeyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extend_hours: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchCreateRequest {
    pub count: u32,
    pub ttl_hours: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_prefix: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchKeysRequest {
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchExtendRequest {
    pub keys: Vec<String>,
    pub extend_hours: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOperationResult {
    #[serde(default)]
    pub success_count: u32,
    #[serde(default)]
    pub failed_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_keys: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchCreateResult {
    #[serde(default)]
    pub success_count: u32,
    #[serde(default)]
    pub failed_count: u32,
    #[serde(default, deserialize_with = "crate::search::types::null_as_default")]
    pub keys: Vec<ApiKeyInfo>,
}

/// Success or partial-success line for a batch call.
pub fn batch_summary(action: &str, success: u32, failed: u32) -> String {
    if failed == 0 {
        format!("{}: {} API key(s)", action, success)
    } else {
        format!("{}: {} succeeded, {} failed", action, success, failed)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct KeyList {
    #[serde(default, deserialize_with = "crate::search::types::null_as_default")]
    pub keys: Vec<ApiKeyInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KeyEnvelope {
    pub key: ApiKeyInfo,
}
