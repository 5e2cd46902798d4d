use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use tower_common::{
    minutes_label, ActionError, ClientConfig, ClockTime, GlowWindow, Mode,
    ScheduleSnapshot, SettingName, ValidationError,
};

use crate::{client::ControllerApi, clock::time_label, status::StatusBoard, store::BaseUrlStore};

/// Local copies of the controller settings, rendered before the controller
/// confirms anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShadowSettings {
    pub mode: Mode,
    pub window: GlowWindow,
    #[serde(rename = "durationMinutes")]
    pub duration_minutes: u32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            mode: Mode::Auto,
            window: GlowWindow::default(),
            duration_minutes: 1,
        }
    }
}

pub type ShadowHandle = Arc<Mutex<ShadowSettings>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Saved,
    /// Another write to the same setting was still in flight.
    Suppressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HourField {
    Start,
    Stop,
}

impl HourField {
    fn setting(self) -> SettingName {
        match self {
            Self::Start => SettingName::StartHour,
            Self::Stop => SettingName::StopHour,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Start => "Start hour",
            Self::Stop => "Stop hour",
        }
    }
}

#[derive(Debug)]
pub struct RefreshReport {
    pub mode: Result<Mode, ActionError>,
    pub schedule: Result<ScheduleSnapshot, ActionError>,
}

impl RefreshReport {
    pub fn is_success(&self) -> bool {
        self.mode.is_ok() && self.schedule.is_ok()
    }
}

/// Clears the flag when the write settles, however it settles.
struct BusyFlag<'a>(&'a AtomicBool);

impl<'a> BusyFlag<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Reads and writes the four controller settings with optimistic local
/// updates.
///
/// Only `mode` rolls back when a write fails; hours and duration keep the
/// optimistic value. Only `mode` and `on_duration` suppress overlapping writes.
pub struct SettingSynchronizer<C> {
    api: C,
    store: BaseUrlStore,
    config: ClientConfig,
    shadow: ShadowHandle,
    board: StatusBoard,
    mode_busy: AtomicBool,
    duration_busy: AtomicBool,
}

impl<C: ControllerApi> SettingSynchronizer<C> {
    pub fn new(
        api: C,
        store: BaseUrlStore,
        config: ClientConfig,
        shadow: ShadowHandle,
        board: StatusBoard,
    ) -> Self {
        Self {
            api,
            store,
            config,
            shadow,
            board,
            mode_busy: AtomicBool::new(false),
            duration_busy: AtomicBool::new(false),
        }
    }

    pub async fn shadow(&self) -> ShadowSettings {
        *self.shadow.lock().await
    }

    pub async fn set_mode(&self, next: Mode) -> Result<WriteOutcome, ActionError> {
        let Some(_busy) = BusyFlag::try_acquire(&self.mode_busy) else {
            return Ok(WriteOutcome::Suppressed);
        };

        if let Err(err) = self.store.get().await.base() {
            let err = ActionError::from(err);
            self.board.set_error(err.to_string()).await;
            return Err(err);
        }

        let previous = {
            let mut shadow = self.shadow.lock().await;
            std::mem::replace(&mut shadow.mode, next)
        };
        self.board.update(|view| view.error = None).await;

        match self
            .api
            .write_setting(SettingName::Mode, next.wire_value())
            .await
        {
            Ok(()) => {
                self.store.confirm().await;
                info!(mode = next.as_str(), "mode saved");
                self.board
                    .set_status(format!("Mode set to {} at {}", next.as_str(), time_label()))
                    .await;
                Ok(WriteOutcome::Saved)
            }
            Err(err) => {
                let err = ActionError::from(err);
                self.shadow.lock().await.mode = previous;
                warn!(
                    "mode write failed, restored {}: {err}",
                    previous.as_str()
                );
                self.board.set_error(err.user_message("Mode request")).await;
                Err(err)
            }
        }
    }

    pub async fn set_start(&self, candidate: &str) -> Result<WriteOutcome, ActionError> {
        self.set_hour(HourField::Start, candidate).await
    }

    pub async fn set_stop(&self, candidate: &str) -> Result<WriteOutcome, ActionError> {
        self.set_hour(HourField::Stop, candidate).await
    }

    async fn set_hour(&self, field: HourField, candidate: &str) -> Result<WriteOutcome, ActionError> {
        let validated = {
            let mut shadow = self.shadow.lock().await;
            let window = candidate.parse::<ClockTime>().and_then(|time| {
                let time = time.whole_hour();
                match field {
                    HourField::Start => shadow.window.with_start(time),
                    HourField::Stop => shadow.window.with_stop(time),
                }
            });
            if let Ok(window) = &window {
                shadow.window = *window;
            }
            window
        };

        let window = match validated {
            Ok(window) => window,
            Err(err) => {
                self.board.set_schedule_error(Some(err.to_string())).await;
                return Err(err.into());
            }
        };
        self.board.set_schedule_error(None).await;

        let hour = match field {
            HourField::Start => window.start.hour(),
            HourField::Stop => window.stop.hour(),
        };

        match self.api.write_setting(field.setting(), hour).await {
            Ok(()) => {
                self.store.confirm().await;
                info!(setting = %field.setting(), hour, "hour saved");
                self.board
                    .set_status(format!("{} saved ({hour}:00)", field.label()))
                    .await;
                Ok(WriteOutcome::Saved)
            }
            Err(err) => {
                let err = ActionError::from(err);
                warn!("{} write failed: {err}", field.setting());
                let action = format!("{} request", field.label());
                self.board.set_error(err.user_message(&action)).await;
                Err(err)
            }
        }
    }

    /// Clamps into the picker range and shows it immediately, even when an
    /// earlier duration write is still in flight.
    pub async fn set_duration(&self, next: u32) -> Result<WriteOutcome, ActionError> {
        let minutes = self.config.clamp_duration(next);
        self.shadow.lock().await.duration_minutes = minutes;

        let Some(_busy) = BusyFlag::try_acquire(&self.duration_busy) else {
            return Ok(WriteOutcome::Suppressed);
        };

        match self
            .api
            .write_setting(SettingName::OnDuration, minutes)
            .await
        {
            Ok(()) => {
                self.store.confirm().await;
                info!(minutes, "blink duration saved");
                self.board
                    .set_status(format!("Blink duration saved ({})", minutes_label(minutes)))
                    .await;
                Ok(WriteOutcome::Saved)
            }
            Err(err) => {
                let err = ActionError::from(err);
                warn!("duration write failed: {err}");
                self.board
                    .set_error(err.user_message("Duration request"))
                    .await;
                Err(err)
            }
        }
    }

    pub async fn sync_mode(&self) -> Result<Mode, ActionError> {
        self.board
            .update(|view| {
                view.syncing_mode = true;
                view.error = None;
            })
            .await;

        let result = self
            .api
            .read_setting(SettingName::Mode)
            .await
            .map(Mode::from_wire);

        match &result {
            Ok(mode) => {
                self.shadow.lock().await.mode = *mode;
                self.board
                    .set_status(format!("Mode synced ({}) at {}", mode.as_str(), time_label()))
                    .await;
            }
            Err(err) => {
                warn!("mode sync failed: {err}");
                self.board.set_error(err.user_message("Mode request")).await;
            }
        }

        self.board.update(|view| view.syncing_mode = false).await;
        result
    }

    async fn sync_schedule(&self) -> Result<ScheduleSnapshot, ActionError> {
        let reads = tokio::try_join!(
            self.api.read_setting(SettingName::StartHour),
            self.api.read_setting(SettingName::StopHour),
            self.api.read_setting(SettingName::OnDuration),
        );

        match reads {
            Ok((start_hour, stop_hour, on_duration)) => {
                {
                    let mut shadow = self.shadow.lock().await;
                    shadow.window = GlowWindow::from_hours(start_hour, stop_hour);
                    shadow.duration_minutes = on_duration;
                }

                let schedule_error = (start_hour >= stop_hour)
                    .then(|| ValidationError::StartNotBeforeStop.to_string());
                if schedule_error.is_some() {
                    warn!(start_hour, stop_hour, "controller holds an inverted glow window");
                }
                self.board.set_schedule_error(schedule_error).await;
                self.board.set_status("Settings synced from controller").await;

                Ok(ScheduleSnapshot {
                    start_hour,
                    stop_hour,
                    on_duration,
                })
            }
            Err(err) => {
                warn!("settings refresh failed: {err}");
                self.board.set_error(err.user_message("Refresh")).await;
                Err(err)
            }
        }
    }

    /// Re-reads everything. The mode track and the schedule track run side by
    /// side; neither blocks the other, and the refreshing flag drops only once
    /// both settle.
    pub async fn refresh_all(&self) -> RefreshReport {
        self.board
            .update(|view| {
                view.refreshing = true;
                view.error = None;
                view.schedule_error = None;
            })
            .await;

        let (mode, schedule) = tokio::join!(self.sync_mode(), self.sync_schedule());

        self.board.update(|view| view.refreshing = false).await;
        RefreshReport { mode, schedule }
    }
}
