//! Signing timestamps.
//!
//! SigV4 uses two renderings of the same UTC instant: the ISO 8601 basic
//! timestamp in the string to sign and `X-Amz-Date`, and the short date in
//! the credential scope and key derivation.

use chrono::{DateTime, TimeZone, Utc};

/// Format of the full timestamp (`YYYYMMDDTHHMMSSZ`).
pub const TIME_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Format of the short date (`YYYYMMDD`).
pub const SHORT_TIME_FORMAT: &str = "%Y%m%d";

/// A signing instant normalized to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SigningTime(DateTime<Utc>);

impl SigningTime {
    /// Normalize any timezone-aware instant to UTC.
    #[must_use]
    pub fn new<Tz: TimeZone>(time: DateTime<Tz>) -> Self {
        Self(time.with_timezone(&Utc))
    }

    /// The full ISO 8601 basic timestamp, e.g. `20150830T123600Z`.
    #[must_use]
    pub fn timestamp(&self) -> String {
        self.0.format(TIME_FORMAT).to_string()
    }

    /// The short date, e.g. `20150830`.
    #[must_use]
    pub fn short_date(&self) -> String {
        self.0.format(SHORT_TIME_FORMAT).to_string()
    }

    /// The underlying UTC instant.
    #[must_use]
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for SigningTime {
    fn from(time: DateTime<Utc>) -> Self {
        Self(time)
    }
}
