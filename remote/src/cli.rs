use chrono::NaiveDateTime;
use sprinkler_common::{
    schedule::{ParseDayError, ParseTimeOfDayError},
    DayOfWeek, ScheduleDraft, ScheduleEntry, ScheduleError, ScheduleUpload, TimeOfDay,
};
use thiserror::Error;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub const USAGE: &str = "\
usage: sprinkler-remote [ACTION]

actions:
  watch                                 poll the controller until Ctrl-C (default)
  status                                poll once and print the decoded status
  on | off | disconnect                 switch the sprinkler
  sync-time                             set the controller clock (/TIM)
  legacy-sync-time [YYYY-MM-DDTHH:mm:ss]
                                        set the clock on older firmware (/SET_TIMESTAMP),
                                        to now or to the given wall-clock time
  schedule ZONES MINUTES [DAY@HH:mm]..  upload up to two weekly start times (/SCH)
  legacy-schedule ZONES MINUTES [DAY@HH:mm]..
                                        same, for older firmware (/SET_SCHEDULE)
  help                                  show this message

DAY is 0-6 (Sunday = 0) or a three-letter name, e.g. wed@14:30.

environment:
  SPRINKLER_CONFIG, SPRINKLER_HOST, SPRINKLER_PORT, SPRINKLER_HEARTBEAT_MS,
  SPRINKLER_TIMEOUT_MS, SPRINKLER_TIMEZONE, SPRINKLER_STATUS_LAYOUT (v1|v2), RUST_LOG";

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Watch,
    Status,
    TurnOn,
    TurnOff,
    Disconnect,
    SyncTime,
    /// `None` sends the current time.
    LegacySyncTime(Option<NaiveDateTime>),
    Schedule(ScheduleUpload),
    LegacySchedule {
        zones: u8,
        duration_minutes: u8,
        draft: ScheduleDraft,
    },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CliError {
    #[error("unknown action {0:?}")]
    UnknownAction(String),
    #[error("missing {0}")]
    MissingArgument(&'static str),
    #[error("unexpected argument {0:?}")]
    UnexpectedArgument(String),
    #[error("{name} must be a number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("timestamp {0:?} must look like YYYY-MM-DDTHH:mm:ss")]
    InvalidTimestamp(String),
    #[error("schedule entry {0:?} must look like DAY@HH:mm")]
    InvalidEntry(String),
    #[error(transparent)]
    Day(#[from] ParseDayError),
    #[error(transparent)]
    Time(#[from] ParseTimeOfDayError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

pub fn parse<I>(args: I) -> Result<Action, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let Some(action) = args.next() else {
        return Ok(Action::Watch);
    };

    let action = match action.as_str() {
        "watch" => Action::Watch,
        "status" => Action::Status,
        "on" => Action::TurnOn,
        "off" => Action::TurnOff,
        "disconnect" => Action::Disconnect,
        "sync-time" => Action::SyncTime,
        "legacy-sync-time" => {
            let at = args.next().map(|raw| parse_timestamp(&raw)).transpose()?;
            Action::LegacySyncTime(at)
        }
        "help" | "-h" | "--help" => Action::Help,
        "schedule" => {
            let (zones, duration_minutes, draft) = parse_schedule_args(&mut args)?;
            return Ok(Action::Schedule(draft.into_upload(zones, duration_minutes)?));
        }
        "legacy-schedule" => {
            let (zones, duration_minutes, draft) = parse_schedule_args(&mut args)?;
            return Ok(Action::LegacySchedule {
                zones,
                duration_minutes,
                draft,
            });
        }
        _ => return Err(CliError::UnknownAction(action)),
    };

    match args.next() {
        Some(extra) => Err(CliError::UnexpectedArgument(extra)),
        None => Ok(action),
    }
}

fn parse_schedule_args(
    args: &mut impl Iterator<Item = String>,
) -> Result<(u8, u8, ScheduleDraft), CliError> {
    let zones = parse_number(args.next(), "ZONES")?;
    let duration_minutes = parse_number(args.next(), "MINUTES")?;

    let mut draft = ScheduleDraft::new();
    for raw in args {
        draft.push(parse_entry(&raw)?)?;
    }

    Ok((zones, duration_minutes, draft))
}

fn parse_number(value: Option<String>, name: &'static str) -> Result<u8, CliError> {
    let value = value.ok_or(CliError::MissingArgument(name))?;
    value
        .parse::<u8>()
        .map_err(|_| CliError::InvalidNumber { name, value })
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, CliError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map_err(|_| CliError::InvalidTimestamp(raw.to_string()))
}

fn parse_entry(raw: &str) -> Result<ScheduleEntry, CliError> {
    let (day, time) = raw
        .split_once('@')
        .ok_or_else(|| CliError::InvalidEntry(raw.to_string()))?;
    Ok(ScheduleEntry::new(
        day.parse::<DayOfWeek>()?,
        time.parse::<TimeOfDay>()?,
    ))
}
