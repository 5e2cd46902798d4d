use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use tower_common::{ClientConfig, RequestError};

use crate::{
    blink::BlinkTracker,
    client::{ControllerApi, ControllerClient},
    clock::{Clock, SystemClock},
    status::{StatusBoard, StatusView},
    store::{BaseUrlStore, SaveStatus},
    synchronizer::{RefreshReport, SettingSynchronizer, ShadowHandle, ShadowSettings},
};

/// Everything the presentation layer renders, in one read.
#[derive(Debug, Clone, Serialize)]
pub struct PanelSnapshot {
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    pub settings: ShadowSettings,
    pub view: StatusView,
    #[serde(rename = "blinkRemainingSecs")]
    pub blink_remaining_secs: u64,
}

/// One control screen: a synchronizer and a blink tracker sharing the shadow
/// settings and the status board.
pub struct ControlPanel<C> {
    store: BaseUrlStore,
    board: StatusBoard,
    shadow: ShadowHandle,
    pub settings: SettingSynchronizer<C>,
    pub blink: BlinkTracker<C>,
}

impl ControlPanel<ControllerClient> {
    pub fn connect(store: BaseUrlStore, config: ClientConfig) -> Result<Self, RequestError> {
        let api = ControllerClient::new(store.clone(), &config)?;
        Ok(Self::with_api(api, store, config, Arc::new(SystemClock)))
    }
}

impl<C: ControllerApi> ControlPanel<C> {
    pub fn with_api(
        api: C,
        store: BaseUrlStore,
        config: ClientConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let board = StatusBoard::new();
        let shadow: ShadowHandle = Arc::new(Mutex::new(ShadowSettings::default()));

        Self {
            settings: SettingSynchronizer::new(
                api.clone(),
                store.clone(),
                config,
                Arc::clone(&shadow),
                board.clone(),
            ),
            blink: BlinkTracker::new(api, store.clone(), clock, Arc::clone(&shadow), board.clone()),
            store,
            board,
            shadow,
        }
    }

    pub fn board(&self) -> &StatusBoard {
        &self.board
    }

    /// Waits for the stored base URL, then pulls the controller state once if
    /// a URL is configured.
    pub async fn start(&self) -> Option<RefreshReport> {
        self.store.wait_ready().await;
        let endpoint = self.store.get().await;
        if !endpoint.is_configured() {
            info!("controller URL not configured; skipping initial refresh");
            self.board
                .set_status(RequestError::Unconfigured.to_string())
                .await;
            return None;
        }
        Some(self.settings.refresh_all().await)
    }

    pub async fn save_base_url(&self, next: &str) -> SaveStatus {
        let saved = self.store.set(next).await;
        self.board.set_status(saved.message()).await;
        saved
    }

    pub async fn snapshot(&self) -> PanelSnapshot {
        PanelSnapshot {
            base_url: self.store.get().await.as_str().to_string(),
            settings: *self.shadow.lock().await,
            view: self.board.snapshot().await,
            blink_remaining_secs: self.blink.remaining_secs().await,
        }
    }
}
