use chrono::{DateTime, Datelike, SecondsFormat, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

/// Body of the `/TIM` command: an RFC 3339 timestamp carrying its UTC offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTimePayload {
    pub datetime: String,
}

impl SetTimePayload {
    pub fn at<Tz>(now: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Self {
            datetime: now.to_rfc3339_opts(SecondsFormat::Secs, false),
        }
    }
}

/// Body of the `/SET_TIMESTAMP` command understood by older firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampParts {
    pub month: u32,
    pub day: u32,
    pub year: i32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl TimestampParts {
    /// Wall-clock fields of `at`, either a zoned `DateTime` or a naive one
    /// picked by the user.
    pub fn from_datetime<T: Datelike + Timelike>(at: &T) -> Self {
        Self {
            month: at.month(),
            day: at.day(),
            year: at.year(),
            hour: at.hour(),
            minute: at.minute(),
            second: at.second(),
        }
    }
}
