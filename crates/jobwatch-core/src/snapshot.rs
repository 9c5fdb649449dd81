//! Job status observations and the JSON frame both transports deliver.
//!
//! A `StatusSnapshot` is built each time a transport receives data and is never
//! mutated afterwards; the controller decides how to merge it into what the
//! user sees.

use serde::Deserialize;
use std::fmt;

use crate::transport::TransportError;

/// Lifecycle status reported by the import job runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Downloading,
    Parsing,
    Saving,
    Completed,
    Failed,
}

impl JobStatus {
    /// `completed` or `failed`: no further snapshots are expected.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Downloading => "downloading",
            JobStatus::Parsing => "parsing",
            JobStatus::Saving => "saving",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One observation of job state.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub status: JobStatus,
    /// Always within [0, 100].
    pub progress_percentage: f64,
    pub current_step: Option<String>,
    /// Present only when `status == Failed`.
    pub error_message: Option<String>,
    /// Identifier of the imported property; present only when `status == Completed`.
    pub result_id: Option<String>,
}

impl StatusSnapshot {
    /// Snapshot with no step, error, or result (mostly useful in tests and fakes).
    pub fn new(status: JobStatus, progress_percentage: f64) -> Self {
        Self {
            status,
            progress_percentage: clamp_progress(progress_percentage),
            current_step: None,
            error_message: None,
            result_id: None,
        }
    }

    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.current_step = Some(step.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        if self.status == JobStatus::Failed {
            self.error_message = Some(message.into());
        }
        self
    }

    pub fn with_result(mut self, result_id: impl Into<String>) -> Self {
        if self.status == JobStatus::Completed {
            self.result_id = Some(result_id.into());
        }
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Frame kind marking the last message on the push stream.
pub const JOB_FINISHED: &str = "job_finished";

/// Raw JSON shape shared by the stream and poll endpoints.
///
/// `type` is only ever sent on the stream.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusFrame {
    pub status: JobStatus,
    #[serde(default)]
    pub progress_percentage: Option<f64>,
    #[serde(default)]
    pub current_step: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default, deserialize_with = "id_as_string")]
    pub property_id: Option<String>,
    #[serde(default, rename = "type")]
    pub frame_type: Option<String>,
}

impl StatusFrame {
    pub fn is_job_finished(&self) -> bool {
        self.frame_type.as_deref() == Some(JOB_FINISHED)
    }

    /// Convert into a snapshot, dropping fields that do not belong to the status.
    pub fn into_snapshot(self) -> StatusSnapshot {
        let status = self.status;
        StatusSnapshot {
            status,
            progress_percentage: clamp_progress(self.progress_percentage.unwrap_or(0.0)),
            current_step: self.current_step.filter(|s| !s.is_empty()),
            error_message: self.error_message.filter(|_| status == JobStatus::Failed),
            result_id: self.property_id.filter(|_| status == JobStatus::Completed),
        }
    }
}

/// Parse one JSON payload into a frame and its snapshot.
pub fn parse_frame(payload: &str) -> Result<(StatusFrame, StatusSnapshot), TransportError> {
    let frame: StatusFrame = serde_json::from_str(payload)?;
    let snapshot = frame.clone().into_snapshot();
    Ok((frame, snapshot))
}

fn clamp_progress(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Accept the artifact id as either a JSON string or number.
fn id_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    }))
}
