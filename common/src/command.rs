use crate::{
    clock::{SetTimePayload, TimestampParts},
    endpoints::*,
    schedule::{LegacyScheduleUpload, ScheduleUpload},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Everything the controller understands. Commands without arguments are
/// plain GETs; the rest POST a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    TurnOn,
    TurnOff,
    Disconnect,
    Heartbeat,
    SetSchedule(ScheduleUpload),
    SetTime(SetTimePayload),
    LegacySetTimestamp(TimestampParts),
    LegacySetSchedule(LegacyScheduleUpload),
}

impl Command {
    pub fn method(&self) -> HttpMethod {
        match self {
            Self::TurnOn | Self::TurnOff | Self::Disconnect | Self::Heartbeat => HttpMethod::Get,
            Self::SetSchedule(_)
            | Self::SetTime(_)
            | Self::LegacySetTimestamp(_)
            | Self::LegacySetSchedule(_) => HttpMethod::Post,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::TurnOn => PATH_TURN_ON,
            Self::TurnOff => PATH_TURN_OFF,
            Self::Disconnect => PATH_DISCONNECT,
            Self::Heartbeat => PATH_HEARTBEAT,
            Self::SetSchedule(_) => PATH_SET_SCHEDULE,
            Self::SetTime(_) => PATH_SET_TIME,
            Self::LegacySetTimestamp(_) => PATH_LEGACY_SET_TIMESTAMP,
            Self::LegacySetSchedule(_) => PATH_LEGACY_SET_SCHEDULE,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TurnOn => "turn-on",
            Self::TurnOff => "turn-off",
            Self::Disconnect => "disconnect",
            Self::Heartbeat => "heartbeat",
            Self::SetSchedule(_) => "set-schedule",
            Self::SetTime(_) => "set-time",
            Self::LegacySetTimestamp(_) => "legacy-set-timestamp",
            Self::LegacySetSchedule(_) => "legacy-set-schedule",
        }
    }

    /// Encoded JSON body for POST commands, `None` for GETs. Keys keep the
    /// field order of the payload struct.
    pub fn json_body(&self) -> serde_json::Result<Option<Vec<u8>>> {
        let body = match self {
            Self::TurnOn | Self::TurnOff | Self::Disconnect | Self::Heartbeat => return Ok(None),
            Self::SetSchedule(upload) => serde_json::to_vec(upload)?,
            Self::SetTime(payload) => serde_json::to_vec(payload)?,
            Self::LegacySetTimestamp(parts) => serde_json::to_vec(parts)?,
            Self::LegacySetSchedule(upload) => serde_json::to_vec(upload)?,
        };
        Ok(Some(body))
    }
}
