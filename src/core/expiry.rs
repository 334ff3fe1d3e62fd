//! Expiry policy for newly signed tokens.
//!
//! An `expires_in` value is a seconds count, given either as a number or
//! as integer text (`"3600"`, `"-60"`). Any other text falls back to one
//! hour.

use chrono::{DateTime, Utc};

/// Lifetime used when `expires_in` text cannot be interpreted.
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// How long a signed token stays valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpiresIn {
    /// An exact number of seconds.
    Seconds(i64),
    /// A seconds count in text form.
    Text(String),
}

impl Default for ExpiresIn {
    fn default() -> Self {
        Self::Seconds(DEFAULT_EXPIRES_IN_SECS)
    }
}

impl From<i64> for ExpiresIn {
    fn from(seconds: i64) -> Self {
        Self::Seconds(seconds)
    }
}

impl From<&str> for ExpiresIn {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ExpiresIn {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl ExpiresIn {
    /// Resolve to a number of seconds.
    pub fn seconds(&self) -> i64 {
        match self {
            Self::Seconds(seconds) => *seconds,
            Self::Text(text) => text.trim().parse().unwrap_or(DEFAULT_EXPIRES_IN_SECS),
        }
    }

    /// The `exp` value for a token issued at `now`.
    pub fn expiry_from(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp().saturating_add(self.seconds())
    }
}
