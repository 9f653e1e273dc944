pub mod clock;
pub mod command;
pub mod config;
pub mod endpoints;
pub mod schedule;
pub mod status;

pub use clock::{SetTimePayload, TimestampParts};
pub use command::{Command, HttpMethod};
pub use config::{ClientConfig, DeviceConfig};
pub use endpoints::*;
pub use schedule::{
    DayOfWeek, LegacyScheduleUpload, ScheduleDraft, ScheduleEntry, ScheduleError, ScheduleUpload,
    TimeOfDay,
};
pub use status::{
    decode, decode_with, ActiveDays, DecodeError, DeviceStatus, HealthFlags, StatusLayout,
};
