//! What the user is currently shown for the tracked job.

use crate::snapshot::{JobStatus, StatusSnapshot};

/// Displayed job state. Only the controller mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    pub status: JobStatus,
    /// The percentage actually shown, in [0, 100].
    pub displayed_progress: f64,
    pub current_step: Option<String>,
    pub error_message: Option<String>,
    pub result_id: Option<String>,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            status: JobStatus::Pending,
            displayed_progress: 0.0,
            current_step: None,
            error_message: None,
            result_id: None,
        }
    }
}

impl DisplayState {
    /// Copy the non-animated fields of a snapshot (everything except progress).
    pub(crate) fn merge_fields(&mut self, snapshot: &StatusSnapshot) {
        self.status = snapshot.status;
        self.current_step = snapshot.current_step.clone();
        self.error_message = snapshot.error_message.clone();
        self.result_id = snapshot.result_id.clone();
    }

    pub(crate) fn set_progress(&mut self, value: f64) {
        self.displayed_progress = value.clamp(0.0, 100.0);
    }
}
