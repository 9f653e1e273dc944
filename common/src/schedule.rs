use std::{fmt, str::FromStr};

use chrono::{DateTime, TimeZone, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub const MIN_ZONES: u8 = 1;
pub const MAX_ZONES: u8 = 4;
pub const LEGACY_MAX_ZONES: u8 = 10;
pub const MAX_DURATION_MINUTES: u8 = 60;

/// Entries the caller may hold before uploading. The device itself does not
/// enforce this.
pub const MAX_DRAFT_ENTRIES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("number of zones {zones} is outside 1..={max}")]
    ZonesOutOfRange { zones: u8, max: u8 },
    #[error("duration {0} min is outside 0..=60")]
    DurationOutOfRange(u8),
    #[error("schedule already holds {0} entries")]
    TooManyEntries(usize),
    #[error("{0} does not exist on the reference date")]
    UnrepresentableTime(TimeOfDay),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("day index {0} is outside 0..=6")]
pub struct InvalidDayIndex(pub u8);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid day of week: {0:?}")]
pub struct ParseDayError(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid time of day {0:?}, expected HH:mm")]
pub struct ParseTimeOfDayError(String);

/// Day of week as the device numbers it: Sunday is 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DayOfWeek {
    Sun,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        Self::Sun,
        Self::Mon,
        Self::Tue,
        Self::Wed,
        Self::Thu,
        Self::Fri,
        Self::Sat,
    ];

    pub fn index(self) -> u8 {
        match self {
            Self::Sun => 0,
            Self::Mon => 1,
            Self::Tue => 2,
            Self::Wed => 3,
            Self::Thu => 4,
            Self::Fri => 5,
            Self::Sat => 6,
        }
    }

    pub fn from_index(index: u8) -> Result<Self, InvalidDayIndex> {
        Self::ALL
            .get(usize::from(index))
            .copied()
            .ok_or(InvalidDayIndex(index))
    }

    pub fn from_chrono(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sun => Self::Sun,
            Weekday::Mon => Self::Mon,
            Weekday::Tue => Self::Tue,
            Weekday::Wed => Self::Wed,
            Weekday::Thu => Self::Thu,
            Weekday::Fri => Self::Fri,
            Weekday::Sat => Self::Sat,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sun => "SUN",
            Self::Mon => "MON",
            Self::Tue => "TUE",
            Self::Wed => "WED",
            Self::Thu => "THU",
            Self::Fri => "FRI",
            Self::Sat => "SAT",
        }
    }
}

impl TryFrom<u8> for DayOfWeek {
    type Error = InvalidDayIndex;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::from_index(index)
    }
}

impl From<DayOfWeek> for u8 {
    fn from(day: DayOfWeek) -> Self {
        day.index()
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the numeric index (`"3"`) or a three-letter name (`"wed"`).
impl FromStr for DayOfWeek {
    type Err = ParseDayError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if let Ok(index) = value.parse::<u8>() {
            return Self::from_index(index).map_err(|_| ParseDayError(value.to_string()));
        }

        let upper = value.to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|day| day.as_str() == upper)
            .ok_or_else(|| ParseDayError(value.to_string()))
    }
}

/// Wall-clock time with minute precision, written as `HH:mm` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = ParseTimeOfDayError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let err = || ParseTimeOfDayError(value.to_string());

        let (hour, minute) = value.split_once(':').ok_or_else(err)?;
        let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
        if !two_digits(hour) || !two_digits(minute) {
            return Err(err());
        }

        let hour = hour.parse::<u8>().map_err(|_| err())?;
        let minute = minute.parse::<u8>().map_err(|_| err())?;
        Self::new(hour, minute).ok_or_else(err)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    #[serde(rename = "dayOfWeek")]
    pub day_of_week: DayOfWeek,
    pub time: TimeOfDay,
}

impl ScheduleEntry {
    pub fn new(day_of_week: DayOfWeek, time: TimeOfDay) -> Self {
        Self { day_of_week, time }
    }
}

/// Body of the `/SCH` command. Only built through [`ScheduleUpload::new`], so
/// zones and duration are always in range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleUpload {
    #[serde(rename = "numberOfZones")]
    number_of_zones: u8,
    duration: u8,
    schedule: Vec<ScheduleEntry>,
}

impl ScheduleUpload {
    pub fn new(
        number_of_zones: u8,
        duration_minutes: u8,
        entries: Vec<ScheduleEntry>,
    ) -> Result<Self, ScheduleError> {
        check_zones(number_of_zones, MAX_ZONES)?;
        check_duration(duration_minutes)?;

        Ok(Self {
            number_of_zones,
            duration: duration_minutes,
            schedule: entries,
        })
    }

    pub fn number_of_zones(&self) -> u8 {
        self.number_of_zones
    }

    pub fn duration_minutes(&self) -> u8 {
        self.duration
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.schedule
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyScheduleEntry {
    #[serde(rename = "dayOfWeek")]
    pub day_of_week: DayOfWeek,
    /// Unix seconds of the entry's time on the day the schedule was built.
    pub time: i64,
}

/// Body of the `/SET_SCHEDULE` command understood by older firmware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegacyScheduleUpload {
    #[serde(rename = "numberOfZones")]
    number_of_zones: u8,
    duration: u8,
    schedule: Vec<LegacyScheduleEntry>,
}

impl LegacyScheduleUpload {
    pub fn new<Tz: TimeZone>(
        number_of_zones: u8,
        duration_minutes: u8,
        entries: &[ScheduleEntry],
        reference: &DateTime<Tz>,
    ) -> Result<Self, ScheduleError> {
        check_zones(number_of_zones, LEGACY_MAX_ZONES)?;
        check_duration(duration_minutes)?;

        let date = reference.date_naive();
        let schedule = entries
            .iter()
            .map(|entry| -> Result<LegacyScheduleEntry, ScheduleError> {
                let naive = date
                    .and_hms_opt(u32::from(entry.time.hour()), u32::from(entry.time.minute()), 0)
                    .ok_or(ScheduleError::UnrepresentableTime(entry.time))?;
                let local = reference
                    .timezone()
                    .from_local_datetime(&naive)
                    .earliest()
                    .ok_or(ScheduleError::UnrepresentableTime(entry.time))?;

                Ok(LegacyScheduleEntry {
                    day_of_week: entry.day_of_week,
                    time: local.timestamp(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            number_of_zones,
            duration: duration_minutes,
            schedule,
        })
    }

    pub fn number_of_zones(&self) -> u8 {
        self.number_of_zones
    }

    pub fn duration_minutes(&self) -> u8 {
        self.duration
    }

    pub fn entries(&self) -> &[LegacyScheduleEntry] {
        &self.schedule
    }
}

/// Entries collected before an upload, capped at [`MAX_DRAFT_ENTRIES`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleDraft {
    entries: Vec<ScheduleEntry>,
}

impl ScheduleDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ScheduleEntry) -> Result<(), ScheduleError> {
        if self.entries.len() >= MAX_DRAFT_ENTRIES {
            return Err(ScheduleError::TooManyEntries(self.entries.len()));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<ScheduleEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_upload(
        self,
        number_of_zones: u8,
        duration_minutes: u8,
    ) -> Result<ScheduleUpload, ScheduleError> {
        ScheduleUpload::new(number_of_zones, duration_minutes, self.entries)
    }
}

fn check_zones(zones: u8, max: u8) -> Result<(), ScheduleError> {
    if (MIN_ZONES..=max).contains(&zones) {
        Ok(())
    } else {
        Err(ScheduleError::ZonesOutOfRange { zones, max })
    }
}

fn check_duration(minutes: u8) -> Result<(), ScheduleError> {
    if minutes <= MAX_DURATION_MINUTES {
        Ok(())
    } else {
        Err(ScheduleError::DurationOutOfRange(minutes))
    }
}
