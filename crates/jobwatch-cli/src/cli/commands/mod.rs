//! CLI command handlers, one file per command.

mod config;
mod watch;

pub use config::run_config;
pub use watch::{run_watch, WatchArgs};

#[cfg(test)]
pub(crate) use watch::{exit_code, progress_line};
