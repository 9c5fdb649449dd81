//! `jobwatch config` – show where the config lives and what is in effect.

use anyhow::Result;
use jobwatch_core::config::{self, JobwatchConfig};

pub fn run_config(cfg: &JobwatchConfig) -> Result<i32> {
    let path = config::config_path()?;
    let sync = cfg.sync_config();
    println!("config file: {}", path.display());
    println!("base_url:    {}", cfg.base_url);
    println!("token_env:   {}", cfg.token_env);
    println!(
        "timeouts:    request {}s, connect {}s, stream idle {}s",
        cfg.request_timeout().as_secs(),
        cfg.connect_timeout().as_secs(),
        cfg.stream_idle_timeout().as_secs()
    );
    println!("sync:        {:#?}", sync);
    Ok(0)
}
