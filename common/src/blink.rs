use crate::error::ValidationError;

pub const MINUTE_MS: i64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkPhase {
    Idle,
    Pending,
    Active { expires_at_ms: i64 },
}

/// Why a trigger did not start a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkRefusal {
    InFlight,
    StillLit { remaining_secs: u64 },
}

impl BlinkRefusal {
    pub fn message(self) -> String {
        match self {
            Self::InFlight => "Blink already in progress".to_string(),
            Self::StillLit { remaining_secs } => {
                format!("LED already on; ready again in {remaining_secs}s")
            }
        }
    }
}

/// Countdown armed for a successful trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmedSession {
    pub generation: u64,
    pub expires_at_ms: i64,
    pub duration_ms: u64,
}

/// Client-side belief about whether the tower is currently lit.
///
/// Nothing here talks to the controller; the caller feeds in wall-clock
/// milliseconds and owns the timer that eventually calls [`BlinkSession::expire`].
#[derive(Debug, Clone)]
pub struct BlinkSession {
    phase: BlinkPhase,
    generation: u64,
}

impl Default for BlinkSession {
    fn default() -> Self {
        Self::new()
    }
}

impl BlinkSession {
    pub fn new() -> Self {
        Self {
            phase: BlinkPhase::Idle,
            generation: 0,
        }
    }

    pub fn phase(&self) -> BlinkPhase {
        self.phase
    }

    pub fn expires_at_ms(&self) -> Option<i64> {
        match self.phase {
            BlinkPhase::Active { expires_at_ms } => Some(expires_at_ms),
            _ => None,
        }
    }

    pub fn remaining_ms(&self, now_ms: i64) -> u64 {
        self.expires_at_ms()
            .map(|expires_at_ms| expires_at_ms.saturating_sub(now_ms).max(0) as u64)
            .unwrap_or(0)
    }

    pub fn is_lit(&self, now_ms: i64) -> bool {
        self.remaining_ms(now_ms) > 0
    }

    /// Idle (or a lapsed Active) -> Pending.
    pub fn begin(&mut self, now_ms: i64) -> Result<(), BlinkRefusal> {
        match self.phase {
            BlinkPhase::Pending => Err(BlinkRefusal::InFlight),
            BlinkPhase::Active { expires_at_ms } if expires_at_ms > now_ms => {
                let remaining = (expires_at_ms - now_ms) as u64;
                Err(BlinkRefusal::StillLit {
                    remaining_secs: remaining.div_ceil(1_000),
                })
            }
            _ => {
                self.phase = BlinkPhase::Pending;
                Ok(())
            }
        }
    }

    /// Pending -> Idle after a failed duration read or blink request.
    pub fn abort(&mut self) {
        if self.phase == BlinkPhase::Pending {
            self.phase = BlinkPhase::Idle;
        }
    }

    /// Pending -> Active. Bumps the generation so a timer armed for an earlier
    /// session can no longer clear this one.
    pub fn activate(
        &mut self,
        now_ms: i64,
        duration_minutes: u32,
    ) -> Result<ArmedSession, ValidationError> {
        if duration_minutes == 0 {
            self.abort();
            return Err(ValidationError::NonPositiveDuration);
        }

        let duration_ms = i64::from(duration_minutes) * MINUTE_MS;
        let expires_at_ms = now_ms.saturating_add(duration_ms);
        self.generation = self.generation.wrapping_add(1);
        self.phase = BlinkPhase::Active { expires_at_ms };

        Ok(ArmedSession {
            generation: self.generation,
            expires_at_ms,
            duration_ms: duration_ms as u64,
        })
    }

    /// Timer callback. Returns whether the session was cleared.
    pub fn expire(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        if matches!(self.phase, BlinkPhase::Active { .. }) {
            self.phase = BlinkPhase::Idle;
            true
        } else {
            false
        }
    }
}
