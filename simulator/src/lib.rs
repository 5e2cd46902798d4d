use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::{net::TcpListener, sync::Mutex};
use tracing::{info, warn};

use tower_common::{SettingName, PATH_BLINK, PATH_CONFIG, QUERY_NAME, QUERY_VALUE};

#[derive(Debug, Clone)]
struct Fault {
    remaining: u32,
    status: StatusCode,
    body: String,
}

#[derive(Debug)]
struct Device {
    settings: [u32; 4],
    blinks: u64,
    config_reads: u64,
    config_writes: u64,
    fault: Option<Fault>,
    delay: Duration,
    read_delays: HashMap<SettingName, Duration>,
    overrides: HashMap<SettingName, String>,
}

impl Default for Device {
    fn default() -> Self {
        let mut settings = [0; 4];
        settings[SettingName::Mode.index()] = 1;
        settings[SettingName::StartHour.index()] = 8;
        settings[SettingName::StopHour.index()] = 18;
        settings[SettingName::OnDuration.index()] = 1;

        Self {
            settings,
            blinks: 0,
            config_reads: 0,
            config_writes: 0,
            fault: None,
            delay: Duration::ZERO,
            read_delays: HashMap::new(),
            overrides: HashMap::new(),
        }
    }
}

impl Device {
    /// Consumes one injected failure, if any are pending.
    fn take_fault(&mut self) -> Option<Response> {
        let fault = self.fault.as_mut()?;
        fault.remaining = fault.remaining.saturating_sub(1);
        let response = (fault.status, fault.body.clone()).into_response();
        if fault.remaining == 0 {
            self.fault = None;
        }
        Some(response)
    }
}

/// In-memory stand-in for the tower controller, with knobs for tests.
#[derive(Clone, Default)]
pub struct SimulatedTower {
    device: Arc<Mutex<Device>>,
}

impl SimulatedTower {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn setting(&self, name: SettingName) -> u32 {
        self.device.lock().await.settings[name.index()]
    }

    pub async fn set_setting(&self, name: SettingName, value: u32) {
        self.device.lock().await.settings[name.index()] = value;
    }

    pub async fn blink_count(&self) -> u64 {
        self.device.lock().await.blinks
    }

    pub async fn config_reads(&self) -> u64 {
        self.device.lock().await.config_reads
    }

    pub async fn config_writes(&self) -> u64 {
        self.device.lock().await.config_writes
    }

    /// The next `count` requests answer with `status` and `body`.
    pub async fn fail_next(&self, count: u32, status: u16, body: &str) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.device.lock().await.fault = (count > 0).then(|| Fault {
            remaining: count,
            status,
            body: body.to_string(),
        });
    }

    pub async fn set_delay(&self, delay: Duration) {
        self.device.lock().await.delay = delay;
    }

    /// Holds reads of `name` for `delay` on top of the global delay.
    pub async fn delay_read(&self, name: SettingName, delay: Duration) {
        self.device.lock().await.read_delays.insert(name, delay);
    }

    /// Answers reads of `name` with `body` verbatim instead of `name=value`.
    pub async fn override_read(&self, name: SettingName, body: &str) {
        self.device
            .lock()
            .await
            .overrides
            .insert(name, body.to_string());
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route(PATH_CONFIG, get(handle_config))
            .route(PATH_BLINK, get(handle_blink))
            .with_state(self.clone())
    }

    /// Serves on an already-bound listener until the task is dropped.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let addr = listener.local_addr()?;
        info!("simulated tower listening on http://{addr}");
        axum::serve(listener, self.router())
            .await
            .context("simulator server stopped")
    }

    /// Binds an ephemeral local port and serves in the background.
    pub async fn spawn_local(&self) -> anyhow::Result<SocketAddr> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind simulator")?;
        let addr = listener.local_addr()?;
        let tower = self.clone();
        tokio::spawn(async move {
            if let Err(err) = tower.serve(listener).await {
                warn!("simulator error: {err:#}");
            }
        });
        Ok(addr)
    }

    async fn pause(&self, read: Option<SettingName>) {
        let delay = {
            let device = self.device.lock().await;
            let extra = read
                .and_then(|name| device.read_delays.get(&name).copied())
                .unwrap_or_default();
            device.delay + extra
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

async fn handle_config(
    State(tower): State<SimulatedTower>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let read = params
        .get(QUERY_NAME)
        .and_then(|name| SettingName::from_wire(name))
        .filter(|_| !params.contains_key(QUERY_VALUE));
    tower.pause(read).await;
    let mut device = tower.device.lock().await;

    if let Some(response) = device.take_fault() {
        return response;
    }

    let Some(name) = params.get(QUERY_NAME) else {
        return text_response(StatusCode::BAD_REQUEST, "Missing 'name' parameter");
    };
    let Some(setting) = SettingName::from_wire(name) else {
        return text_response(StatusCode::BAD_REQUEST, "unknown setting");
    };

    let Some(value) = params.get(QUERY_VALUE) else {
        device.config_reads += 1;
        if let Some(body) = device.overrides.get(&setting) {
            return text_response(StatusCode::OK, body);
        }
        let current = device.settings[setting.index()];
        return text_response(StatusCode::OK, &format!("{setting}={current}"));
    };

    let Ok(value) = value.parse::<u32>() else {
        return text_response(StatusCode::BAD_REQUEST, "invalid value");
    };
    if let Err(reason) = validate_write(setting, value) {
        return text_response(StatusCode::BAD_REQUEST, reason);
    }

    device.config_writes += 1;
    device.settings[setting.index()] = value;
    info!("{setting} set to {value}");
    text_response(StatusCode::OK, "OK")
}

async fn handle_blink(State(tower): State<SimulatedTower>) -> Response {
    tower.pause(None).await;
    let mut device = tower.device.lock().await;

    if let Some(response) = device.take_fault() {
        return response;
    }

    device.blinks += 1;
    let minutes = device.settings[SettingName::OnDuration.index()];
    info!("blink #{} for {minutes} min", device.blinks);
    text_response(StatusCode::OK, "OK")
}

fn validate_write(setting: SettingName, value: u32) -> Result<(), &'static str> {
    match setting {
        SettingName::Mode if value > 1 => Err("mode must be 0 or 1"),
        SettingName::StartHour | SettingName::StopHour if value > 23 => {
            Err("hour must be between 0 and 23")
        }
        SettingName::OnDuration if value == 0 => Err("on_duration must be positive"),
        _ => Ok(()),
    }
}

fn text_response(status: StatusCode, message: &str) -> Response {
    (status, message.to_string()).into_response()
}
