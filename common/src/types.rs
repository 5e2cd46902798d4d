use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Auto,
    Manual,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "Auto",
            Self::Manual => "Manual",
        }
    }

    /// Non-zero reads as Auto.
    pub fn from_wire(value: u32) -> Self {
        if value != 0 {
            Self::Auto
        } else {
            Self::Manual
        }
    }

    pub fn wire_value(self) -> u32 {
        match self {
            Self::Auto => 1,
            Self::Manual => 0,
        }
    }
}

/// The four scalar settings held by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingName {
    Mode,
    StartHour,
    StopHour,
    OnDuration,
}

impl SettingName {
    pub const ALL: [SettingName; 4] = [
        Self::Mode,
        Self::StartHour,
        Self::StopHour,
        Self::OnDuration,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mode => "mode",
            Self::StartHour => "start_hour",
            Self::StopHour => "stop_hour",
            Self::OnDuration => "on_duration",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Mode => 0,
            Self::StartHour => 1,
            Self::StopHour => 2,
            Self::OnDuration => 3,
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|setting| setting.as_str() == name)
    }
}

impl fmt::Display for SettingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values read back from the controller in one refresh pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleSnapshot {
    #[serde(rename = "startHour")]
    pub start_hour: u32,
    #[serde(rename = "stopHour")]
    pub stop_hour: u32,
    #[serde(rename = "onDuration")]
    pub on_duration: u32,
}

pub fn minutes_label(minutes: u32) -> String {
    if minutes > 1 {
        format!("{minutes} minutes")
    } else {
        format!("{minutes} minute")
    }
}
