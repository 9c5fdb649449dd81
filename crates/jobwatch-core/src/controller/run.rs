//! Async driver: runs one controller on its own task.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::auth::TokenProvider;
use crate::config::SyncConfig;
use crate::observer::{JobObserver, Outcome};
use crate::transport::{Envelope, Transports};

use super::{StartError, SyncController};

#[derive(Debug, Clone, Copy)]
enum Command {
    Stop,
    Cancel,
}

/// Cloneable stop/cancel access to a running controller.
#[derive(Debug, Clone)]
pub struct SyncControls {
    tx: mpsc::UnboundedSender<Command>,
}

impl SyncControls {
    /// Stop tracking (unmount). Idempotent; no callback is invoked afterwards.
    pub fn stop(&self) {
        let _ = self.tx.send(Command::Stop);
    }

    /// Stop tracking and invoke `on_cancel` once, unless already finished.
    pub fn cancel(&self) {
        let _ = self.tx.send(Command::Cancel);
    }
}

/// Handle to a spawned controller. Dropping the handle and every
/// [`SyncControls`] clone stops the controller.
pub struct SyncHandle {
    controls: SyncControls,
    task: JoinHandle<Outcome>,
}

impl SyncHandle {
    pub fn controls(&self) -> SyncControls {
        self.controls.clone()
    }

    pub fn stop(&self) {
        self.controls.stop();
    }

    pub fn cancel(&self) {
        self.controls.cancel();
    }

    /// Wait for the session to end.
    pub async fn join(self) -> Result<Outcome, tokio::task::JoinError> {
        let SyncHandle { controls, task } = self;
        let outcome = task.await;
        drop(controls);
        outcome
    }
}

/// Start tracking `job_id` on a new task.
pub fn spawn<O>(
    job_id: impl Into<String>,
    config: SyncConfig,
    credentials: Arc<dyn TokenProvider>,
    transports: Transports,
    observer: O,
) -> Result<SyncHandle, StartError>
where
    O: JobObserver + 'static,
{
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let mut controller = SyncController::new(
        job_id.into(),
        config,
        credentials,
        transports,
        observer,
        events_tx,
    )?;
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    controller.start();
    let task = tokio::spawn(drive(controller, events_rx, command_rx));
    Ok(SyncHandle {
        controls: SyncControls { tx: command_tx },
        task,
    })
}

async fn drive<O: JobObserver>(
    mut controller: SyncController<O>,
    mut events: mpsc::UnboundedReceiver<Envelope>,
    mut commands: mpsc::UnboundedReceiver<Command>,
) -> Outcome {
    while !controller.is_stopped() {
        let deadline = controller.next_deadline();
        tokio::select! {
            biased;
            command = commands.recv() => match command {
                Some(Command::Cancel) => controller.cancel(),
                Some(Command::Stop) | None => controller.stop(),
            },
            Some(envelope) = events.recv() => controller.handle(envelope, Instant::now()),
            _ = sleep_until(deadline) => controller.fire_due(Instant::now()),
        }
    }
    controller.into_outcome()
}

fn sleep_until(deadline: Option<Instant>) -> impl Future<Output = ()> {
    async move {
        match deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending().await,
        }
    }
}
