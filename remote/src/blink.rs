use std::{sync::Arc, time::Duration};

use tokio::{sync::Mutex, task::JoinHandle, time::Instant};
use tracing::{info, warn};

use tower_common::{
    ActionError, ArmedSession, BlinkPhase, BlinkRefusal, BlinkSession, SettingName,
    ValidationError,
};

use crate::{
    client::ControllerApi, clock::Clock, status::StatusBoard, store::BaseUrlStore,
    synchronizer::ShadowHandle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkOutcome {
    Started {
        duration_minutes: u32,
        expires_at_ms: i64,
    },
    Refused(BlinkRefusal),
}

/// Triggers blinks and keeps the local countdown of when the tower should go
/// dark again. There is no confirmation from the controller; the countdown is
/// the only thing that returns the session to idle.
pub struct BlinkTracker<C> {
    api: C,
    store: BaseUrlStore,
    clock: Arc<dyn Clock>,
    shadow: ShadowHandle,
    board: StatusBoard,
    session: Arc<Mutex<BlinkSession>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl<C: ControllerApi> BlinkTracker<C> {
    pub fn new(
        api: C,
        store: BaseUrlStore,
        clock: Arc<dyn Clock>,
        shadow: ShadowHandle,
        board: StatusBoard,
    ) -> Self {
        Self {
            api,
            store,
            clock,
            shadow,
            board,
            session: Arc::new(Mutex::new(BlinkSession::new())),
            timer: Mutex::new(None),
        }
    }

    pub async fn phase(&self) -> BlinkPhase {
        self.session.lock().await.phase()
    }

    pub async fn expires_at_ms(&self) -> Option<i64> {
        self.session.lock().await.expires_at_ms()
    }

    pub async fn remaining_secs(&self) -> u64 {
        let now_ms = self.clock.now_ms();
        self.session.lock().await.remaining_ms(now_ms).div_ceil(1_000)
    }

    pub async fn is_active(&self) -> bool {
        let now_ms = self.clock.now_ms();
        self.session.lock().await.is_lit(now_ms)
    }

    pub async fn trigger(&self) -> Result<BlinkOutcome, ActionError> {
        if let Err(err) = self.store.get().await.base() {
            let err = ActionError::from(err);
            self.board.set_error(err.to_string()).await;
            return Err(err);
        }

        let begun = {
            let now_ms = self.clock.now_ms();
            self.session.lock().await.begin(now_ms)
        };
        if let Err(refusal) = begun {
            info!("blink refused: {}", refusal.message());
            self.board.set_status(refusal.message()).await;
            return Ok(BlinkOutcome::Refused(refusal));
        }

        self.board
            .update(|view| {
                view.sending = true;
                view.error = None;
            })
            .await;

        let result = self.run_pending().await;

        self.board.update(|view| view.sending = false).await;

        match result {
            Ok((duration_minutes, armed)) => Ok(BlinkOutcome::Started {
                duration_minutes,
                expires_at_ms: armed.expires_at_ms,
            }),
            Err(err) => {
                self.session.lock().await.abort();
                warn!("blink trigger failed: {err}");
                self.board.set_error(err.user_message("Request")).await;
                Err(err)
            }
        }
    }

    async fn run_pending(&self) -> Result<(u32, ArmedSession), ActionError> {
        let duration_minutes = self.api.read_setting(SettingName::OnDuration).await?;
        if duration_minutes == 0 {
            return Err(ValidationError::NonPositiveDuration.into());
        }
        self.shadow.lock().await.duration_minutes = duration_minutes;

        self.api.trigger_blink().await?;

        let armed = {
            let now_ms = self.clock.now_ms();
            self.session
                .lock()
                .await
                .activate(now_ms, duration_minutes)?
        };
        self.arm_timer(armed).await;

        self.store.confirm().await;
        info!(
            duration_minutes,
            expires_at_ms = armed.expires_at_ms,
            "blink started"
        );
        self.board
            .set_status(format!("Blinking for {duration_minutes} min"))
            .await;

        Ok((duration_minutes, armed))
    }

    /// Cancels whatever countdown is running before arming the new one, so at
    /// most one timer exists per tracker.
    async fn arm_timer(&self, armed: ArmedSession) {
        let mut slot = self.timer.lock().await;
        if let Some(stale) = slot.take() {
            stale.abort();
        }

        let deadline = Instant::now() + Duration::from_millis(armed.duration_ms);
        let session = Arc::clone(&self.session);
        let board = self.board.clone();
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let cleared = session.lock().await.expire(armed.generation);
            if cleared {
                info!(generation = armed.generation, "blink countdown finished");
                board.set_status("Ready to blink").await;
            }
        }));
    }

    /// Resolves once the current session (if any) has been cleared by its
    /// countdown.
    pub async fn wait_until_idle(&self) {
        loop {
            let remaining_ms = {
                let now_ms = self.clock.now_ms();
                let session = self.session.lock().await;
                if !matches!(session.phase(), BlinkPhase::Active { .. }) {
                    return;
                }
                session.remaining_ms(now_ms)
            };
            tokio::time::sleep(Duration::from_millis(remaining_ms.max(50))).await;
        }
    }
}

impl<C> Drop for BlinkTracker<C> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.get_mut().take() {
            timer.abort();
        }
    }
}
