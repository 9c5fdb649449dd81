pub mod config;
pub mod logging;

pub mod animator;
pub mod auth;
pub mod controller;
pub mod display;
pub mod endpoint;
pub mod observer;
pub mod retry;
pub mod simulator;
pub mod snapshot;
pub mod transport;

pub use controller::{spawn, StartError, SyncControls, SyncController, SyncHandle, SyncState};
pub use display::DisplayState;
pub use observer::{JobObserver, JobUpdate, Outcome};
pub use snapshot::{JobStatus, StatusSnapshot};
