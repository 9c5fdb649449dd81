//! `jobwatch watch` – follow one import job until it reaches a terminal state.

use anyhow::{Context, Result};
use jobwatch_core::auth::{EnvToken, StaticToken, TokenProvider};
use jobwatch_core::config::JobwatchConfig;
use jobwatch_core::endpoint::Endpoints;
use jobwatch_core::transport::{http_client, HttpTimeouts, Transports};
use jobwatch_core::{spawn, DisplayState, JobUpdate, Outcome};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

/// Exit status after Ctrl-C, as a shell would report SIGINT.
const EXIT_CANCELLED: i32 = 130;

#[derive(Debug, Default)]
pub struct WatchArgs {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub poll_only: bool,
}

pub(crate) fn exit_code(outcome: &Outcome) -> i32 {
    match outcome {
        Outcome::Completed { .. } => 0,
        Outcome::Cancelled => EXIT_CANCELLED,
        Outcome::Failed { .. } | Outcome::Stopped => 1,
    }
}

pub async fn run_watch(cfg: &JobwatchConfig, job_id: &str, args: WatchArgs) -> Result<i32> {
    let mut sync = cfg.sync_config();
    if args.poll_only {
        sync.stream_enabled = false;
    }
    let base_url = args.base_url.unwrap_or_else(|| cfg.base_url.clone());
    let endpoints =
        Endpoints::new(&base_url).with_context(|| format!("invalid base URL {}", base_url))?;
    let credentials: Arc<dyn TokenProvider> = match args.token {
        Some(token) => Arc::new(StaticToken::new(Some(token))),
        None => Arc::new(EnvToken::new(cfg.token_env.clone())),
    };
    let client = http_client(cfg.connect_timeout()).context("building HTTP client")?;
    let transports = Transports::http(
        client,
        endpoints,
        Arc::clone(&credentials),
        HttpTimeouts {
            request: cfg.request_timeout(),
            stream_idle: cfg.stream_idle_timeout(),
        },
        sync.poll_cadence(),
    );

    let (update_tx, update_rx) = mpsc::unbounded_channel::<JobUpdate>();
    let handle = spawn(job_id, sync, credentials, transports, update_tx)?;
    tracing::info!(job_id, base_url = %base_url, "watching import job");

    let printer = tokio::spawn(print_updates(update_rx));
    let controls = handle.controls();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, cancelling");
            controls.cancel();
        }
    });

    let outcome = handle.join().await.context("sync task failed")?;
    interrupt.abort();
    printer.await.context("progress printer failed")?;
    tracing::info!(job_id, ?outcome, "watch finished");
    Ok(exit_code(&outcome))
}

/// Prints throttled progress lines and the final result. Ends when the
/// controller drops its observer.
async fn print_updates(mut rx: mpsc::UnboundedReceiver<JobUpdate>) {
    let mut last_print: Option<Instant> = None;
    while let Some(update) = rx.recv().await {
        match update {
            JobUpdate::Progress(state) => {
                let now = Instant::now();
                let due = last_print.map_or(true, |t| now.duration_since(t) >= PROGRESS_INTERVAL);
                if due || state.status.is_terminal() {
                    println!("{}", progress_line(&state));
                    last_print = Some(now);
                }
            }
            JobUpdate::Completed { result_id, .. } => match result_id {
                Some(id) => println!("import completed: {}", id),
                None => println!("import completed"),
            },
            JobUpdate::Failed(message) => eprintln!("import failed: {}", message),
            JobUpdate::Cancelled => println!("tracking cancelled"),
        }
    }
}

pub(crate) fn progress_line(state: &DisplayState) -> String {
    let line = format!("{:<10}  {:>3.0}%", state.status, state.displayed_progress);
    match state.current_step.as_deref() {
        Some(step) if !step.is_empty() => format!("{}  {}", line, step),
        _ => line,
    }
}
