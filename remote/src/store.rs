use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::PathBuf,
    sync::Arc,
};

use anyhow::Context;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use tower_common::{ClientConfig, ControllerEndpoint};

/// Where the base URL is persisted between runs.
#[derive(Clone)]
pub enum StorageBackend {
    File(FileKeyValueStore),
    Memory(MemoryKeyValueStore),
}

impl StorageBackend {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        match self {
            Self::File(store) => store.get(key).await,
            Self::Memory(store) => Ok(store.get(key).await),
        }
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        match self {
            Self::File(store) => store.set(key, value).await,
            Self::Memory(store) => {
                store.set(key, value).await;
                Ok(())
            }
        }
    }
}

/// JSON object of string values in a single file.
#[derive(Clone)]
pub struct FileKeyValueStore {
    path: Arc<PathBuf>,
    lock: Arc<Mutex<()>>,
}

impl FileKeyValueStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(data_dir.into().join("remote.json")),
            lock: Arc::new(Mutex::new(())),
        }
    }

    async fn read_all(&self) -> anyhow::Result<BTreeMap<String, String>> {
        match tokio::fs::read(self.path.as_ref()).await {
            Ok(raw) => serde_json::from_slice(&raw)
                .with_context(|| format!("corrupt key-value file {}", self.path.display())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    pub async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await.unwrap_or_else(|err| {
            warn!("discarding unreadable key-value file: {err:#}");
            BTreeMap::new()
        });
        entries.insert(key.to_string(), value.to_string());

        let path = self.path.as_ref().clone();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let payload = serde_json::to_vec_pretty(&entries)?;
        tokio::fs::write(&path, payload)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Process-local storage; clones share the same entries.
#[derive(Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().await.get(key).cloned()
    }

    pub async fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    Cleared,
}

impl SaveStatus {
    pub fn message(self) -> &'static str {
        match self {
            Self::Saved => "Saved",
            Self::Cleared => "Cleared; setup required",
        }
    }
}

struct StoreInner {
    endpoint: Mutex<ControllerEndpoint>,
    ready: watch::Sender<bool>,
    backend: StorageBackend,
    key: String,
}

/// Owner of the controller base URL.
///
/// Cheap to clone; every clone sees the same in-memory value. Storage errors
/// are logged and never surfaced: the in-memory value stays authoritative for
/// the running process.
#[derive(Clone)]
pub struct BaseUrlStore {
    inner: Arc<StoreInner>,
}

impl BaseUrlStore {
    pub fn new(backend: StorageBackend, config: &ClientConfig) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            inner: Arc::new(StoreInner {
                endpoint: Mutex::new(ControllerEndpoint::new(config.default_base_url.clone())),
                ready,
                backend,
                key: config.storage_key.clone(),
            }),
        }
    }

    /// Reads the persisted value once and marks the store ready. Later calls
    /// return the current value without touching storage.
    pub async fn load(&self) -> ControllerEndpoint {
        if self.is_ready() {
            return self.get().await;
        }

        let endpoint = {
            let mut endpoint = self.inner.endpoint.lock().await;
            match self.inner.backend.get(&self.inner.key).await {
                Ok(Some(stored)) if !stored.trim().is_empty() => {
                    *endpoint = ControllerEndpoint::new(stored);
                }
                Ok(_) => {}
                Err(err) => warn!("failed to load base URL, using default: {err:#}"),
            }
            endpoint.clone()
        };

        self.inner.ready.send_replace(true);
        info!(base_url = endpoint.as_str(), "base URL store ready");
        endpoint
    }

    pub fn is_ready(&self) -> bool {
        *self.inner.ready.borrow()
    }

    pub async fn wait_ready(&self) {
        let mut ready = self.inner.ready.subscribe();
        // The sender lives as long as `self`, so this only ends once ready.
        let _ = ready.wait_for(|ready| *ready).await;
    }

    pub async fn get(&self) -> ControllerEndpoint {
        self.inner.endpoint.lock().await.clone()
    }

    /// Replaces the base URL, then persists it.
    pub async fn set(&self, next: &str) -> SaveStatus {
        let endpoint = ControllerEndpoint::new(next);
        {
            *self.inner.endpoint.lock().await = endpoint.clone();
        }
        self.persist(&endpoint).await;

        if endpoint.is_configured() {
            SaveStatus::Saved
        } else {
            SaveStatus::Cleared
        }
    }

    /// Re-saves the current value after a controller call went through.
    pub async fn confirm(&self) {
        let endpoint = self.get().await;
        self.persist(&endpoint).await;
    }

    async fn persist(&self, endpoint: &ControllerEndpoint) {
        if let Err(err) = self
            .inner
            .backend
            .set(&self.inner.key, endpoint.as_str())
            .await
        {
            warn!("failed to persist base URL: {err:#}");
        }
    }
}
