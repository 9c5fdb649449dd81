//! Outward callbacks to the UI caller.

use tokio::sync::mpsc;

use crate::display::DisplayState;
use crate::snapshot::StatusSnapshot;

/// Receives display updates and the terminal notification for one job.
///
/// The controller guarantees that at most one of `on_complete`, `on_error`
/// and `on_cancel` is invoked, at most once, and that nothing is invoked after
/// the controller has stopped.
pub trait JobObserver: Send {
    /// Displayed state changed (real update, animation frame or simulated tick).
    fn on_progress(&mut self, _state: &DisplayState) {}

    fn on_complete(&mut self, result_id: Option<&str>, snapshot: &StatusSnapshot);

    fn on_error(&mut self, message: &str);

    /// The caller asked to cancel tracking. Cancelling the job itself on the
    /// server is the caller's business.
    fn on_cancel(&mut self) {}
}

/// How a tracking session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Completed { result_id: Option<String> },
    Failed { message: String },
    Cancelled,
    /// Stopped from outside (unmount) before any terminal snapshot.
    Stopped,
}

/// Observer notifications as values, for callers that prefer a channel.
#[derive(Debug, Clone, PartialEq)]
pub enum JobUpdate {
    Progress(DisplayState),
    Completed {
        result_id: Option<String>,
        snapshot: StatusSnapshot,
    },
    Failed(String),
    Cancelled,
}

impl JobObserver for mpsc::UnboundedSender<JobUpdate> {
    fn on_progress(&mut self, state: &DisplayState) {
        let _ = self.send(JobUpdate::Progress(state.clone()));
    }

    fn on_complete(&mut self, result_id: Option<&str>, snapshot: &StatusSnapshot) {
        let _ = self.send(JobUpdate::Completed {
            result_id: result_id.map(str::to_string),
            snapshot: snapshot.clone(),
        });
    }

    fn on_error(&mut self, message: &str) {
        let _ = self.send(JobUpdate::Failed(message.to_string()));
    }

    fn on_cancel(&mut self) {
        let _ = self.send(JobUpdate::Cancelled);
    }
}
