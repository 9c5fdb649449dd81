//! Simulated forward progress while the server is silent.
//!
//! The decision of whether a tick may run lives in one guard that reads only the
//! display state and the last moment the display changed for a real reason
//! (a real snapshot or the end of an animation).

use std::time::Duration;
use tokio::time::Instant;

use crate::display::DisplayState;
use crate::snapshot::JobStatus;

/// Outcome of one simulator tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimulatorTick {
    /// Show this value.
    Advance(f64),
    /// Nothing to do this tick; keep the simulator armed.
    Skip,
    /// Status left `processing` or the ceiling was reached; disarm.
    Stop,
}

/// Staleness simulator parameters.
#[derive(Debug, Clone, Copy)]
pub struct StalenessSimulator {
    /// Silence required before any fabricated progress.
    pub window: Duration,
    /// Delay between two simulated increments.
    pub interval: Duration,
    /// Simulated progress never exceeds this value.
    pub ceiling: f64,
    /// Increment applied per tick.
    pub step: f64,
}

impl Default for StalenessSimulator {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(2000),
            interval: Duration::from_millis(2000),
            ceiling: 85.0,
            step: 1.0,
        }
    }
}

impl StalenessSimulator {
    /// Evaluate a tick at `now`.
    ///
    /// `quiet_since` is when the display last settled on real data; progress is
    /// only fabricated once strictly more than `window` has passed since then.
    /// `animating` is true while an animation cycle owns the display; the
    /// simulator never writes on the same tick.
    pub fn tick(
        &self,
        display: &DisplayState,
        quiet_since: Option<Instant>,
        animating: bool,
        now: Instant,
    ) -> SimulatorTick {
        if display.status != JobStatus::Processing {
            return SimulatorTick::Stop;
        }
        if display.displayed_progress >= self.ceiling {
            return SimulatorTick::Stop;
        }
        if animating {
            return SimulatorTick::Skip;
        }
        let stale = quiet_since.map_or(true, |t| now.saturating_duration_since(t) > self.window);
        if !stale {
            return SimulatorTick::Skip;
        }
        let next = (display.displayed_progress + self.step).min(self.ceiling);
        SimulatorTick::Advance(next)
    }
}
