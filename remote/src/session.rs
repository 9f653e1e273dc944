use std::{sync::Arc, time::Duration};

use chrono::{DateTime, FixedOffset, Local, Offset, Utc};
use chrono_tz::Tz;
use reqwest::StatusCode;
use sprinkler_common::{
    decode_with, ClientConfig, Command, DecodeError, DeviceStatus, ScheduleUpload,
    SetTimePayload, StatusLayout, TimestampParts,
};
use thiserror::Error;
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

use crate::client::{DeviceClient, TransportError};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("device answered with http status {0}")]
    Status(StatusCode),
    #[error("undecodable device response: {0}")]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Status {
        command: &'static str,
        status: DeviceStatus,
    },
    Failed {
        command: &'static str,
        message: String,
    },
}

/// Owns the heartbeat and the latest decoded status of one controller.
///
/// Every request runs as its own task; replies land in the status slot in
/// arrival order, so a slow reply can overwrite a newer one.
pub struct Session {
    inner: Arc<Inner>,
    heartbeat_interval: Duration,
    heartbeat: Option<JoinHandle<()>>,
}

struct Inner {
    client: DeviceClient,
    layout: StatusLayout,
    timezone: Option<Tz>,
    latest: watch::Sender<Option<DeviceStatus>>,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut config = config.clone();
        config.sanitize();

        let client = DeviceClient::new(
            &config.device,
            Duration::from_millis(config.request_timeout_ms),
        )?;

        let timezone = config
            .timezone
            .as_deref()
            .and_then(|name| match name.parse::<Tz>() {
                Ok(tz) => Some(tz),
                Err(err) => {
                    warn!("ignoring timezone {name:?}: {err}; using local time");
                    None
                }
            });

        let (latest, _) = watch::channel(None);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                layout: config.status_layout,
                timezone,
                latest,
                events,
            }),
            heartbeat_interval: Duration::from_millis(config.heartbeat_interval_ms),
            heartbeat: None,
        })
    }

    pub fn device_url(&self) -> &str {
        self.inner.client.base_url()
    }

    /// Sends `command` on its own task. The handle resolves once the reply
    /// is decoded and, for an unset device clock, once the clock sync went out.
    pub fn submit(&self, command: Command) -> JoinHandle<Result<DeviceStatus, SessionError>> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.run(command).await })
    }

    pub fn upload_schedule(
        &self,
        upload: ScheduleUpload,
    ) -> JoinHandle<Result<DeviceStatus, SessionError>> {
        self.submit(Command::SetSchedule(upload))
    }

    pub fn sync_clock(&self) -> JoinHandle<Result<DeviceStatus, SessionError>> {
        self.submit(self.inner.set_time_command())
    }

    pub fn legacy_sync_clock(&self) -> JoinHandle<Result<DeviceStatus, SessionError>> {
        self.legacy_set_clock(TimestampParts::from_datetime(&self.now()))
    }

    /// Sets an older controller's clock to an arbitrary wall-clock time.
    pub fn legacy_set_clock(
        &self,
        parts: TimestampParts,
    ) -> JoinHandle<Result<DeviceStatus, SessionError>> {
        self.submit(Command::LegacySetTimestamp(parts))
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.inner.now()
    }

    pub fn latest(&self) -> Option<DeviceStatus> {
        self.inner.latest.borrow().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Polls immediately, then once per heartbeat interval. No-op while running.
    pub fn start_heartbeat(&mut self) {
        if self.is_heartbeat_running() {
            return;
        }

        let inner = Arc::clone(&self.inner);
        let period = self.heartbeat_interval;
        info!(interval_ms = period.as_millis() as u64, "starting heartbeat");

        self.heartbeat = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let inner = Arc::clone(&inner);
                // Detached so a slow device never delays the next beat.
                tokio::spawn(async move {
                    let _ = inner.run(Command::Heartbeat).await;
                });
            }
        }));
    }

    /// Stops future beats; requests already in flight still complete.
    pub fn stop_heartbeat(&mut self) {
        if let Some(handle) = self.heartbeat.take() {
            handle.abort();
            info!("heartbeat stopped");
        }
    }

    pub fn is_heartbeat_running(&self) -> bool {
        self.heartbeat
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop_heartbeat();
    }
}

impl Inner {
    async fn run(&self, command: Command) -> Result<DeviceStatus, SessionError> {
        let status = self.execute(&command).await?;

        let sets_clock = matches!(
            command,
            Command::SetTime(_) | Command::LegacySetTimestamp(_)
        );
        if status.needs_clock_sync() && !sets_clock {
            info!(year = %status.year, "device clock is unset, sending current time");
            // Result is already recorded; the original reply is what the caller asked for.
            let _ = self.execute(&self.set_time_command()).await;
        }

        Ok(status)
    }

    async fn execute(&self, command: &Command) -> Result<DeviceStatus, SessionError> {
        let result = self.exchange(command).await;

        match &result {
            Ok(status) => {
                debug!(
                    command = command.name(),
                    sprinkler_on = status.sprinkler_on,
                    active_days = status.active_days.bits(),
                    "status updated"
                );
                self.latest.send_replace(Some(status.clone()));
                let _ = self.events.send(SessionEvent::Status {
                    command: command.name(),
                    status: status.clone(),
                });
            }
            Err(err) => {
                warn!(command = command.name(), "request failed: {err}");
                let _ = self.events.send(SessionEvent::Failed {
                    command: command.name(),
                    message: err.to_string(),
                });
            }
        }

        result
    }

    async fn exchange(&self, command: &Command) -> Result<DeviceStatus, SessionError> {
        let response = self.client.send(command).await?;
        if response.status != StatusCode::OK {
            return Err(SessionError::Status(response.status));
        }
        Ok(decode_with(&response.body, self.layout)?)
    }

    fn set_time_command(&self) -> Command {
        Command::SetTime(SetTimePayload::at(&self.now()))
    }

    fn now(&self) -> DateTime<FixedOffset> {
        now_in_timezone(self.timezone.as_ref())
    }
}

fn now_in_timezone(timezone: Option<&Tz>) -> DateTime<FixedOffset> {
    match timezone {
        Some(tz) => {
            let local = Utc::now().with_timezone(tz);
            local.with_timezone(&local.offset().fix())
        }
        None => {
            let local = Local::now();
            local.with_timezone(&local.offset().fix())
        }
    }
}
