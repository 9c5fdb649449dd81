use std::time::Duration;

/// Decision returned after a stream failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Reopen the stream after the given delay.
    RetryAfter(Duration),
    /// Too many consecutive failures; poll for the rest of the session.
    FallBackToPolling,
}

/// Linear backoff for stream reconnects with a hard failure threshold.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    /// Consecutive failures after which the stream is abandoned.
    pub failure_threshold: u32,
    /// Delay unit; the n-th consecutive failure waits `n * base_delay`.
    pub base_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            base_delay: Duration::from_millis(2000),
        }
    }
}

impl ReconnectPolicy {
    /// Backoff before the next attempt after `failure_count` consecutive failures.
    pub fn delay(&self, failure_count: u32) -> Duration {
        self.base_delay.saturating_mul(failure_count.max(1))
    }

    /// `failure_count` is the number of consecutive failures including the one
    /// just observed.
    pub fn decide(&self, failure_count: u32) -> ReconnectDecision {
        if failure_count >= self.failure_threshold.max(1) {
            return ReconnectDecision::FallBackToPolling;
        }
        ReconnectDecision::RetryAfter(self.delay(failure_count))
    }
}

/// Fixed poll cadence: nominal interval after a good fetch, longer after an error.
#[derive(Debug, Clone, Copy)]
pub struct PollCadence {
    pub interval: Duration,
    pub error_interval: Duration,
}

impl Default for PollCadence {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(3000),
            error_interval: Duration::from_millis(5000),
        }
    }
}

impl PollCadence {
    pub fn next_delay(&self, last_fetch_failed: bool) -> Duration {
        if last_fetch_failed {
            self.error_interval
        } else {
            self.interval
        }
    }
}
