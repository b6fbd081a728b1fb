//! Logging for sdfield.

#[macro_use]
mod macros;

pub use log::{Level, LevelFilter, debug, error, info, log, log_enabled, trace, warn};
