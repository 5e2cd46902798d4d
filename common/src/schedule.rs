use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Time of day held as minutes since midnight, rendered as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClockTime(u16);

impl ClockTime {
    /// Top of the given hour. Values read from the controller are clamped into
    /// 0-23 so a misbehaving device still renders.
    pub fn from_hour_clamped(hour: u32) -> Self {
        Self(hour.min(23) as u16 * 60)
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    /// Whole hour written to the controller.
    pub fn hour(self) -> u32 {
        u32::from(self.0 / 60)
    }

    pub fn minute(self) -> u32 {
        u32::from(self.0 % 60)
    }

    /// Drops the minutes; the controller only stores whole hours.
    pub fn whole_hour(self) -> Self {
        Self(self.0 - self.0 % 60)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = ValidationError;

    /// Accepts `HH:MM` or a bare `HH`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        let (hour, minute) = match value.split_once(':') {
            Some((hour, minute)) => (hour, minute),
            None => (value, "0"),
        };
        let hour: u16 = hour
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidTime)?;
        let minute: u16 = minute
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidTime)?;
        if hour > 23 || minute > 59 {
            return Err(ValidationError::InvalidTime);
        }
        Ok(Self(hour * 60 + minute))
    }
}

/// Daily window during which the tower glows in Auto mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlowWindow {
    pub start: ClockTime,
    pub stop: ClockTime,
}

impl Default for GlowWindow {
    fn default() -> Self {
        Self {
            start: ClockTime(8 * 60),
            stop: ClockTime(18 * 60),
        }
    }
}

impl GlowWindow {
    pub fn from_hours(start_hour: u32, stop_hour: u32) -> Self {
        Self {
            start: ClockTime::from_hour_clamped(start_hour),
            stop: ClockTime::from_hour_clamped(stop_hour),
        }
    }

    /// Compares the whole hours that reach the controller.
    pub fn is_ordered(&self) -> bool {
        self.start.hour() < self.stop.hour()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_ordered() {
            Ok(())
        } else {
            Err(ValidationError::StartNotBeforeStop)
        }
    }

    /// Window that would result from moving the start, if it stays ordered.
    pub fn with_start(&self, start: ClockTime) -> Result<Self, ValidationError> {
        let candidate = Self { start, ..*self };
        candidate.validate().map(|()| candidate)
    }

    pub fn with_stop(&self, stop: ClockTime) -> Result<Self, ValidationError> {
        let candidate = Self { stop, ..*self };
        if candidate.is_ordered() {
            Ok(candidate)
        } else {
            Err(ValidationError::StopNotAfterStart)
        }
    }
}
