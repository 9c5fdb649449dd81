//! Controller and transport state.

use std::fmt;

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Opening the stream.
    Connecting,
    /// Stream open and delivering snapshots.
    Streaming,
    /// Stream failed fewer times than the threshold; reconnect scheduled.
    Degraded,
    /// Poll transport drives snapshots for the rest of the session.
    Polling,
    /// Terminal snapshot processed; everything torn down.
    Terminal,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncState::Connecting => "connecting",
            SyncState::Streaming => "streaming",
            SyncState::Degraded => "degraded",
            SyncState::Polling => "polling",
            SyncState::Terminal => "terminal",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Stream,
    Polling,
}

/// Transport selection; `Polling` is one-way for the life of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportState {
    pub mode: TransportMode,
    /// Reset to 0 whenever the stream opens successfully.
    pub consecutive_stream_failures: u32,
}

impl Default for TransportState {
    fn default() -> Self {
        Self {
            mode: TransportMode::Stream,
            consecutive_stream_failures: 0,
        }
    }
}
