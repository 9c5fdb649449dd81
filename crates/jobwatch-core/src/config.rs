use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::{PollCadence, ReconnectPolicy};
use crate::simulator::StalenessSimulator;

/// Timing and threshold parameters of the synchronization controller
/// (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Open the push stream first; false goes straight to polling.
    pub stream_enabled: bool,
    /// Consecutive stream failures before polling takes over for good.
    pub stream_failure_threshold: u32,
    /// Reconnect delay unit; the n-th failure waits n times this.
    pub reconnect_base_ms: u64,
    /// Delay between polls after a successful fetch.
    pub poll_interval_ms: u64,
    /// Delay between polls after a failed fetch.
    pub poll_error_interval_ms: u64,
    /// Progress jumps larger than this many points are animated.
    pub animation_threshold: f64,
    pub animation_duration_ms: u64,
    pub animation_steps: u32,
    /// Silence after which simulated progress kicks in.
    pub staleness_window_ms: u64,
    pub simulator_interval_ms: u64,
    /// Simulated progress never goes above this value.
    pub simulator_ceiling: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            stream_enabled: true,
            stream_failure_threshold: 3,
            reconnect_base_ms: 2000,
            poll_interval_ms: 3000,
            poll_error_interval_ms: 5000,
            animation_threshold: 10.0,
            animation_duration_ms: 2000,
            animation_steps: 30,
            staleness_window_ms: 2000,
            simulator_interval_ms: 2000,
            simulator_ceiling: 85.0,
        }
    }
}

impl SyncConfig {
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            failure_threshold: self.stream_failure_threshold,
            base_delay: Duration::from_millis(self.reconnect_base_ms),
        }
    }

    pub fn poll_cadence(&self) -> PollCadence {
        PollCadence {
            interval: Duration::from_millis(self.poll_interval_ms),
            error_interval: Duration::from_millis(self.poll_error_interval_ms),
        }
    }

    pub fn simulator(&self) -> StalenessSimulator {
        StalenessSimulator {
            window: Duration::from_millis(self.staleness_window_ms),
            interval: Duration::from_millis(self.simulator_interval_ms),
            ceiling: self.simulator_ceiling,
            step: 1.0,
        }
    }

    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }
}

/// Global configuration loaded from `~/.config/jobwatch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobwatchConfig {
    /// Base URL of the property-management API.
    pub base_url: String,
    /// Environment variable holding the access token.
    pub token_env: String,
    /// Per-request timeout for status polls, in seconds.
    pub request_timeout_secs: u64,
    /// Connect timeout for both transports, in seconds.
    pub connect_timeout_secs: u64,
    /// A stream that delivers no bytes (not even keep-alive comments) for this
    /// long is treated as dead and reconnected, in seconds.
    #[serde(default = "default_stream_idle_timeout_secs")]
    pub stream_idle_timeout_secs: u64,
    /// Optional controller tuning; if missing, built-in defaults are used.
    #[serde(default)]
    pub sync: Option<SyncConfig>,
}

impl Default for JobwatchConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            token_env: "JOBWATCH_TOKEN".to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            stream_idle_timeout_secs: default_stream_idle_timeout_secs(),
            sync: None,
        }
    }
}

impl JobwatchConfig {
    pub fn sync_config(&self) -> SyncConfig {
        self.sync.clone().unwrap_or_default()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }

    pub fn stream_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_idle_timeout_secs.max(1))
    }
}

fn default_stream_idle_timeout_secs() -> u64 {
    60
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("jobwatch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<JobwatchConfig> {
    load_or_init_at(&config_path()?)
}

pub fn load_or_init_at(path: &std::path::Path) -> Result<JobwatchConfig> {
    if !path.exists() {
        let default_cfg = JobwatchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: JobwatchConfig = toml::from_str(&data)?;
    Ok(cfg)
}
