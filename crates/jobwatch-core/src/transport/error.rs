//! Transport error taxonomy.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    /// Request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Endpoint answered with a non-2xx status.
    #[error("HTTP {0}")]
    Status(u16),
    /// No access token was available for the stream URL.
    #[error("no access credential available")]
    MissingCredential,
    /// Stream ended without a `job_finished` frame.
    #[error("stream closed by server")]
    Closed,
    /// Stream stayed open but delivered nothing for this long.
    #[error("stream silent for {0:?}")]
    Idle(Duration),
    /// Payload was not a valid status frame.
    #[error("malformed status payload: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Base URL cannot host the status endpoints.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl TransportError {
    /// Decode failures are skipped by the stream and never count as a connection failure.
    pub fn is_malformed(&self) -> bool {
        matches!(self, TransportError::Malformed(_))
    }
}
