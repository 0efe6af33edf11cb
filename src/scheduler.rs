use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDateTime, NaiveTime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::dream::DreamWeaver;
use crate::events::Reply;
use crate::host::SessionDirectory;

/// How long to wait before re-reading a malformed trigger time
pub const INVALID_TIME_RETRY: Duration = Duration::from_secs(3600);

/// What the daily loop should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wake {
    /// Sleep `wait`, then trigger at `at`
    At { at: NaiveDateTime, wait: Duration },
    /// The configured time is unusable; look again after `wait`
    Retry { wait: Duration },
}

/// Parse an "HH:MM" time of day.
pub fn parse_trigger_time(raw: &str) -> Result<NaiveTime> {
    let mut fields = raw.split(':');
    let (Some(hour), Some(minute), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(anyhow!("expected HH:MM, got '{}'", raw));
    };

    let hour: u32 = hour.trim().parse().context("hour is not an integer")?;
    let minute: u32 = minute.trim().parse().context("minute is not an integer")?;

    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| anyhow!("'{}' is not a time of day", raw))
}

/// Next occurrence of `raw` after `now`. A time equal to `now` counts as passed.
pub fn next_wake(now: NaiveDateTime, raw: &str) -> Wake {
    let Ok(time) = parse_trigger_time(raw) else {
        return Wake::Retry {
            wait: INVALID_TIME_RETRY,
        };
    };

    let mut at = now.date().and_time(time);
    if now >= at {
        at += chrono::Duration::days(1);
    }

    let wait = (at - now).to_std().unwrap_or(Duration::ZERO);
    Wake::At { at, wait }
}

/// Source of local wall-clock time
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Background task that weaves dreams once a day
pub struct DailyTrigger {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl DailyTrigger {
    /// Start the daily task if the trigger mode asks for it.
    pub async fn start_if_enabled(
        weaver: DreamWeaver,
        directory: Option<Arc<dyn SessionDirectory>>,
    ) -> Option<Self> {
        if !weaver.config().read().await.is_daily_auto() {
            return None;
        }
        Some(Self::spawn(weaver, directory, Arc::new(SystemClock)))
    }

    pub fn spawn(
        weaver: DreamWeaver,
        directory: Option<Arc<dyn SessionDirectory>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_daily(weaver, directory, clock, cancel.clone()));
        Self { cancel, handle }
    }

    /// Cancel the task and wait for it to wind down.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(err) = self.handle.await {
            error!("Daily dream task ended abnormally: {err:?}");
        }
    }
}

async fn run_daily(
    weaver: DreamWeaver,
    directory: Option<Arc<dyn SessionDirectory>>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
) {
    loop {
        let raw = weaver.config().read().await.auto_trigger_time.clone();

        let (wait, trigger) = match next_wake(clock.now(), &raw) {
            Wake::Retry { wait } => {
                error!(
                    "Invalid auto_trigger_time format: {}. Please use HH:MM format.",
                    raw
                );
                (wait, false)
            }
            Wake::At { at, wait } => {
                info!(
                    "Next automatic dream at: {}, waiting for {} seconds.",
                    at,
                    wait.as_secs()
                );
                (wait, true)
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(wait) => {}
        }

        if !trigger {
            continue;
        }

        info!("Daily auto-dream task triggered.");
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = dream_for_sessions(&weaver, directory.as_deref()) => {}
        }
    }

    info!("Daily dream monitoring task cancelled.");
}

async fn dream_for_sessions(weaver: &DreamWeaver, directory: Option<&dyn SessionDirectory>) {
    if !weaver.config().read().await.enabled {
        return;
    }

    let Some(directory) = directory else {
        warn!("Automatic dreams need a session directory from the host; skipping.");
        return;
    };

    let sessions = match directory.active_sessions().await {
        Ok(sessions) => sessions,
        Err(err) => {
            error!("Failed to list active sessions: {:#}", err);
            return;
        }
    };

    for session in sessions {
        let reply = match weaver.weave(&session).await {
            Ok(image_url) => Reply::image(image_url),
            Err(err) => err.to_reply(),
        };
        if let Err(err) = directory.send(&session.unified_origin, reply).await {
            error!(
                origin = session.unified_origin.as_str(),
                "Failed to deliver automatic dream: {:#}", err
            );
        }
    }
}
