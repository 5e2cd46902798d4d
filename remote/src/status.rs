use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

/// What the user currently sees: one status line, one error line, the schedule
/// error under the pickers, and the busy indicators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub status: Option<String>,
    pub error: Option<String>,
    #[serde(rename = "scheduleError")]
    pub schedule_error: Option<String>,
    pub refreshing: bool,
    #[serde(rename = "syncingMode")]
    pub syncing_mode: bool,
    pub sending: bool,
}

#[derive(Clone, Default)]
pub struct StatusBoard {
    inner: Arc<Mutex<StatusView>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> StatusView {
        self.inner.lock().await.clone()
    }

    pub async fn update(&self, apply: impl FnOnce(&mut StatusView)) {
        let mut view = self.inner.lock().await;
        apply(&mut view);
    }

    pub async fn set_status(&self, message: impl Into<String>) {
        self.inner.lock().await.status = Some(message.into());
    }

    pub async fn set_error(&self, message: impl Into<String>) {
        self.inner.lock().await.error = Some(message.into());
    }

    pub async fn set_schedule_error(&self, message: Option<String>) {
        self.inner.lock().await.schedule_error = message;
    }
}
