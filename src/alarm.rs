//! Alarm arming, deadline bookkeeping and countdown text.
//!
//! ```text
//!        arm(ok)          fire()           dismiss()
//!  Idle ─────────► Armed ────────► Ringing ─────────► Idle
//!   ▲ │ arm(err)     │ arm(ok)
//!   └─┘              └──────► Armed (new deadline)
//! ```

use std::time::Duration;

use tokio::time::Instant;

use crate::error::AlarmError;

/// Requested delay before the alarm rings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlarmConfig {
    pub hours: u32,
    pub minutes: u32,
}

impl AlarmConfig {
    pub fn new(hours: u32, minutes: u32) -> Self {
        Self { hours, minutes }
    }

    /// Builds a config from raw field text. Anything that is not a number
    /// counts as zero.
    pub fn from_fields(hours: &str, minutes: &str) -> Self {
        Self {
            hours: parse_field(hours),
            minutes: parse_field(minutes),
        }
    }

    pub fn total_minutes(&self) -> u64 {
        u64::from(self.hours) * 60 + u64::from(self.minutes)
    }

    pub fn duration(&self) -> Result<Duration, AlarmError> {
        match self.total_minutes() {
            0 => Err(AlarmError::NonPositiveDuration),
            minutes => Ok(Duration::from_millis(minutes * 60_000)),
        }
    }
}

fn parse_field(text: &str) -> u32 {
    text.trim().parse().unwrap_or(0)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlarmPhase {
    Idle,
    Armed { deadline: Instant },
    Ringing,
}

#[derive(Debug)]
pub struct AlarmClock {
    phase: AlarmPhase,
}

impl AlarmClock {
    pub fn new() -> Self {
        Self {
            phase: AlarmPhase::Idle,
        }
    }

    pub fn phase(&self) -> AlarmPhase {
        self.phase
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            AlarmPhase::Armed { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// Arms (or re-arms) the clock. A rejected config leaves the phase alone.
    pub fn arm(&mut self, config: AlarmConfig, now: Instant) -> Result<Instant, AlarmError> {
        let deadline = now + config.duration()?;
        self.phase = AlarmPhase::Armed { deadline };
        Ok(deadline)
    }

    /// Time left until the deadline, or `None` once it has passed or the
    /// clock is not armed.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let deadline = self.deadline()?;
        let remaining = deadline.saturating_duration_since(now);
        (!remaining.is_zero()).then_some(remaining)
    }

    /// Returns true on the `Armed → Ringing` edge.
    pub fn fire(&mut self) -> bool {
        if matches!(self.phase, AlarmPhase::Armed { .. }) {
            self.phase = AlarmPhase::Ringing;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.phase = AlarmPhase::Idle;
    }
}

impl Default for AlarmClock {
    fn default() -> Self {
        Self::new()
    }
}

pub const COUNTDOWN_FLOOR: &str = "00:00:00";

/// Formats a duration as `HH:MM:SS`. Hours keep counting past 24.
pub fn format_time(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
