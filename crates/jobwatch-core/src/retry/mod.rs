//! Reconnect and poll cadence policy.
//!
//! The controller asks these types how long to wait and whether to keep using
//! the stream; timer mechanics stay in the controller so the policy can be
//! tested in isolation.

mod classify;
mod policy;

pub use classify::{classify, FailureKind};
pub use policy::{PollCadence, ReconnectDecision, ReconnectPolicy};
