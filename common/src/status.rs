//! Decoding of the fixed-layout status string the controller returns inside
//! its `{"status": "..."}` envelope.
//!
//! Canonical layout (offsets in bytes):
//!
//! | Range   | Field                                      |
//! |---------|--------------------------------------------|
//! | `0..4`  | clock year, `1970` when the clock is unset |
//! | `21..24`| on/off word, decimal `u16`                 |
//! | `26..29`| status word, decimal `u8`                  |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schedule::DayOfWeek;

/// Year reported by a controller whose clock was never set.
pub const UNSET_CLOCK_YEAR: &str = "1970";

const YEAR: std::ops::Range<usize> = 0..4;
const ON_OFF: std::ops::Range<usize> = 21..24;
const STATUS_WORD: std::ops::Range<usize> = 26..29;

const SPRINKLER_ON_SHIFT: u16 = 7;
const ACTIVE_DAYS_MASK: u16 = 0x7F;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("response is not a status envelope")]
    InvalidEnvelope,
    #[error("on/off field is not an unsigned 16-bit decimal")]
    InvalidOnOffField,
    #[error("status word is not an unsigned 8-bit decimal")]
    InvalidStatusWordField,
}

/// Revision of the status string layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLayout {
    /// Early firmware: on/off word runs from offset 21 to the end, no status word.
    V1,
    #[default]
    V2,
}

impl StatusLayout {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "v1" => Some(Self::V1),
            "v2" => Some(Self::V2),
            _ => None,
        }
    }
}

/// Days with an active schedule, one bit per day, LSB = Sunday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActiveDays(u8);

impl ActiveDays {
    pub fn from_bits(bits: u8) -> Self {
        Self(bits & ACTIVE_DAYS_MASK as u8)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, day: DayOfWeek) -> bool {
        self.0 & (1 << day.index()) != 0
    }

    pub fn days(self) -> impl Iterator<Item = DayOfWeek> {
        DayOfWeek::ALL
            .into_iter()
            .filter(move |day| self.contains(*day))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthFlags {
    #[serde(rename = "scheduleInvalid")]
    pub schedule_invalid: bool,
    #[serde(rename = "heapLow")]
    pub heap_low: bool,
    #[serde(rename = "timeNotSet")]
    pub time_not_set: bool,
    #[serde(rename = "commandError")]
    pub command_error: bool,
    #[serde(rename = "rssiWeak")]
    pub rssi_weak: bool,
}

impl HealthFlags {
    pub fn from_bits(word: u8) -> Self {
        let bit = |n: u8| (word >> n) & 0x01 == 1;
        Self {
            schedule_invalid: bit(0),
            heap_low: bit(1),
            time_not_set: bit(2),
            command_error: bit(3),
            rssi_weak: bit(4),
        }
    }

    pub fn any(self) -> bool {
        self.schedule_invalid
            || self.heap_low
            || self.time_not_set
            || self.command_error
            || self.rssi_weak
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Copied verbatim; not required to be numeric.
    pub year: String,
    #[serde(rename = "activeDays")]
    pub active_days: ActiveDays,
    #[serde(rename = "sprinklerOn")]
    pub sprinkler_on: bool,
    pub health: HealthFlags,
}

impl DeviceStatus {
    pub fn needs_clock_sync(&self) -> bool {
        self.year == UNSET_CLOCK_YEAR
    }
}

#[derive(Deserialize)]
struct Envelope {
    status: String,
}

/// Decodes a response body using the canonical layout.
pub fn decode(body: &[u8]) -> Result<DeviceStatus, DecodeError> {
    decode_with(body, StatusLayout::default())
}

pub fn decode_with(body: &[u8], layout: StatusLayout) -> Result<DeviceStatus, DecodeError> {
    let envelope: Envelope =
        serde_json::from_slice(body).map_err(|_| DecodeError::InvalidEnvelope)?;
    decode_status(&envelope.status, layout)
}

/// Decodes the bare status string, without the JSON envelope.
pub fn decode_status(status: &str, layout: StatusLayout) -> Result<DeviceStatus, DecodeError> {
    let (on_off, health) = match layout {
        StatusLayout::V2 => {
            let on_off = status
                .get(ON_OFF)
                .and_then(|raw| raw.parse::<u16>().ok())
                .ok_or(DecodeError::InvalidOnOffField)?;
            let word = status
                .get(STATUS_WORD)
                .and_then(|raw| raw.parse::<u8>().ok())
                .ok_or(DecodeError::InvalidStatusWordField)?;
            (on_off, HealthFlags::from_bits(word))
        }
        StatusLayout::V1 => {
            let on_off = status
                .get(ON_OFF.start..)
                .and_then(|raw| raw.parse::<u16>().ok())
                .ok_or(DecodeError::InvalidOnOffField)?;
            (on_off, HealthFlags::default())
        }
    };

    let year = status.chars().take(YEAR.end).collect::<String>();

    Ok(DeviceStatus {
        year,
        active_days: ActiveDays::from_bits((on_off & ACTIVE_DAYS_MASK) as u8),
        sprinkler_on: (on_off >> SPRINKLER_ON_SHIFT) & 0x01 == 1,
        health,
    })
}
