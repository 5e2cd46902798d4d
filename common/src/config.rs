use serde::{Deserialize, Serialize};

use crate::wire::{DEFAULT_BASE_URL, STORAGE_KEY_BASE_URL};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub request_timeout_ms: u64,
    pub default_base_url: String,
    pub storage_key: String,
    pub min_duration_minutes: u32,
    pub max_duration_minutes: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 8_000,
            default_base_url: DEFAULT_BASE_URL.to_string(),
            storage_key: STORAGE_KEY_BASE_URL.to_string(),
            min_duration_minutes: 1,
            max_duration_minutes: 5,
        }
    }
}

impl ClientConfig {
    pub fn sanitize(&mut self) {
        self.request_timeout_ms = self.request_timeout_ms.max(100);

        if self.min_duration_minutes == 0 {
            self.min_duration_minutes = 1;
        }
        if self.max_duration_minutes < self.min_duration_minutes {
            self.max_duration_minutes = self.min_duration_minutes;
        }

        if self.storage_key.trim().is_empty() {
            self.storage_key = STORAGE_KEY_BASE_URL.to_string();
        }
    }

    pub fn clamp_duration(&self, minutes: u32) -> u32 {
        minutes.clamp(self.min_duration_minutes, self.max_duration_minutes)
    }
}
