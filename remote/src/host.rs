use anyhow::Context;
use chrono::Datelike;
use sprinkler_common::{Command, DayOfWeek, DeviceStatus, LegacyScheduleUpload, TimestampParts};
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    cli::{self, Action},
    session::{Session, SessionError, SessionEvent},
    settings,
};

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let action = cli::parse(std::env::args().skip(1))
        .map_err(|err| anyhow::anyhow!("{err}\n\n{}", cli::USAGE))?;
    if action == Action::Help {
        println!("{}", cli::USAGE);
        return Ok(());
    }

    let config = settings::load().await;
    let mut session = Session::new(&config).context("failed to set up device client")?;
    info!(device = session.device_url(), "sprinkler remote ready");

    match action {
        Action::Watch => watch(&mut session).await,
        Action::Status => report(session.submit(Command::Heartbeat)).await,
        Action::TurnOn => report(session.submit(Command::TurnOn)).await,
        Action::TurnOff => report(session.submit(Command::TurnOff)).await,
        Action::Disconnect => report(session.submit(Command::Disconnect)).await,
        Action::SyncTime => report(session.sync_clock()).await,
        Action::LegacySyncTime(None) => report(session.legacy_sync_clock()).await,
        Action::LegacySyncTime(Some(at)) => {
            report(session.legacy_set_clock(TimestampParts::from_datetime(&at))).await
        }
        Action::Schedule(upload) => report(session.upload_schedule(upload)).await,
        Action::LegacySchedule {
            zones,
            duration_minutes,
            draft,
        } => {
            let upload =
                LegacyScheduleUpload::new(zones, duration_minutes, draft.entries(), &session.now())
                    .context("invalid legacy schedule")?;
            report(session.submit(Command::LegacySetSchedule(upload))).await
        }
        Action::Help => Ok(()),
    }
}

async fn report(handle: JoinHandle<Result<DeviceStatus, SessionError>>) -> anyhow::Result<()> {
    let status = handle
        .await
        .context("device request task failed")?
        .context("device request failed")?;
    print_status(&status)
}

async fn watch(session: &mut Session) -> anyhow::Result<()> {
    let mut events = session.subscribe();
    session.start_heartbeat();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result.context("failed to listen for ctrl-c")?;
                session.stop_heartbeat();
                if let Some(status) = session.latest() {
                    info!(sprinkler_on = status.sprinkler_on, year = %status.year, "last known status");
                }
                return Ok(());
            }
            event = events.recv() => match event {
                Ok(SessionEvent::Status { command, status }) => {
                    let today = DayOfWeek::from_chrono(session.now().weekday());
                    info!(
                        command,
                        sprinkler_on = status.sprinkler_on,
                        scheduled_today = status.active_days.contains(today),
                        "status received"
                    );
                    if status.health.any() {
                        warn!(command, health = ?status.health, "controller reports a problem");
                    }
                    print_status(&status)?;
                }
                Ok(SessionEvent::Failed { command, message }) => {
                    eprintln!("{command}: {message}");
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("skipped {skipped} session events");
                }
                Err(RecvError::Closed) => return Ok(()),
            }
        }
    }
}

fn print_status(status: &DeviceStatus) -> anyhow::Result<()> {
    let rendered = serde_json::to_string(status).context("failed to render status")?;
    println!("{rendered}");
    Ok(())
}
