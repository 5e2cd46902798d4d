use chrono::{Local, Utc};

/// Wall-clock source for blink expiry timestamps.
pub trait Clock: Send + Sync + 'static {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Local `HH:MM:SS` used in status lines.
pub fn time_label() -> String {
    Local::now().format("%H:%M:%S").to_string()
}
