//! Classify transport errors for the stream failure counter.

use crate::transport::TransportError;

/// How a transport error affects reconnect policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Bad payload on a healthy connection: logged and skipped.
    Malformed,
    /// Connection-level failure: counts toward the stream failure threshold.
    Connection,
}

pub fn classify(err: &TransportError) -> FailureKind {
    if err.is_malformed() {
        FailureKind::Malformed
    } else {
        FailureKind::Connection
    }
}
