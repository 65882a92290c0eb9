//! Immutable configuration and state types for the timer-driven pipelines.

pub mod options;
pub mod watchdog;

pub use options::{PollOptions, WatchdogOptions};
pub use watchdog::{WatchdogEvent, WatchdogSample, WatchdogState};
