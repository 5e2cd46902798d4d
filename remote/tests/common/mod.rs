//! Shared fixtures for remote integration tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc, Mutex,
    },
};

use tower_common::{ClientConfig, RequestError, SettingName};
use tower_remote::{
    BaseUrlStore, Clock, ControlPanel, ControllerApi, ControllerClient, ControllerRequest,
    MemoryKeyValueStore, StorageBackend, SystemClock,
};
use tower_simulator::SimulatedTower;

/// Store backed by process memory, already loaded.
#[allow(dead_code)]
pub async fn memory_store(base_url: &str) -> BaseUrlStore {
    let store = BaseUrlStore::new(
        StorageBackend::Memory(MemoryKeyValueStore::new()),
        &ClientConfig::default(),
    );
    store.load().await;
    store.set(base_url).await;
    store
}

/// Panel talking HTTP to a fresh simulator on a local port.
#[allow(dead_code)]
pub async fn simulated_panel(
    config: ClientConfig,
) -> (ControlPanel<ControllerClient>, SimulatedTower) {
    let tower = SimulatedTower::new();
    let addr = tower
        .spawn_local()
        .await
        .expect("simulator should bind a local port");
    let store = memory_store(&format!("http://{addr}")).await;
    let api = ControllerClient::new(store.clone(), &config).expect("http client should build");
    let panel = ControlPanel::with_api(api, store, config, Arc::new(SystemClock));
    (panel, tower)
}

/// Clock that only moves when told to.
#[allow(dead_code)]
pub struct ManualClock(AtomicI64);

#[allow(dead_code)]
impl ManualClock {
    pub fn new(start_ms: i64) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(start_ms)))
    }

    pub fn advance(&self, ms: i64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct FakeState {
    bodies: HashMap<SettingName, String>,
    blink_error: Option<RequestError>,
    read_error: Option<RequestError>,
    calls: Vec<ControllerRequest>,
}

/// Controller double that answers instantly and records every call.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct FakeController {
    state: Arc<Mutex<FakeState>>,
}

#[allow(dead_code)]
impl FakeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(&self, name: SettingName, body: &str) {
        self.state
            .lock()
            .unwrap()
            .bodies
            .insert(name, body.to_string());
    }

    pub fn fail_blink(&self, error: Option<RequestError>) {
        self.state.lock().unwrap().blink_error = error;
    }

    pub fn fail_reads(&self, error: Option<RequestError>) {
        self.state.lock().unwrap().read_error = error;
    }

    pub fn calls(&self) -> Vec<ControllerRequest> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn blink_calls(&self) -> usize {
        self.calls()
            .into_iter()
            .filter(|call| *call == ControllerRequest::Blink)
            .count()
    }
}

impl ControllerApi for FakeController {
    async fn call(&self, request: ControllerRequest) -> Result<String, RequestError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(request);
        match request {
            ControllerRequest::Read(name) => {
                if let Some(err) = state.read_error.clone() {
                    return Err(err);
                }
                Ok(state
                    .bodies
                    .get(&name)
                    .cloned()
                    .unwrap_or_else(|| format!("{name}=0")))
            }
            ControllerRequest::Write(..) => Ok("OK".to_string()),
            ControllerRequest::Blink => match state.blink_error.clone() {
                Some(err) => Err(err),
                None => Ok("OK".to_string()),
            },
        }
    }
}

/// Panel wired to a [`FakeController`] and a manual clock.
#[allow(dead_code)]
pub async fn fake_panel(
    fake: &FakeController,
    clock: Arc<ManualClock>,
) -> ControlPanel<FakeController> {
    let store = memory_store("http://192.168.4.1").await;
    ControlPanel::with_api(fake.clone(), store, ClientConfig::default(), clock)
}
