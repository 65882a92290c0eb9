//! Cancellable, time-driven background pipelines.
//!
//! # Architecture
//!
//! - [`data`] - Options and state types
//! - [`core`] - Pure state (the watchdog's strike window)
//! - `effects` - Tickers, single-flight primitives, polling and the watchdog
//!
//! # Key Features
//!
//! - **Injected time**: every loop is driven by a [`CancellableTicker`], periodic in
//!   production and manual in tests
//! - **Poll-until-ready**: [`acquire`] queries until a value appears; [`Acquirer`]
//!   shares one loop among all waiters for the same key
//! - **Two-strike watchdog**: [`DualConditionWatchdog`] fires once after consecutive
//!   unhealthy samples of two joined probes

pub mod core;
pub mod data;
mod effects;
mod error;

pub use crate::core::StrikeWindow;
pub use data::{PollOptions, WatchdogEvent, WatchdogOptions, WatchdogSample, WatchdogState};
pub use effects::{
    AcquireHandle, Acquirer, CancellableTicker, DualConditionWatchdog, Flight, FlightLease, FlightPermit,
    Probe, ProbeFn, SingleFlightGroup, SingleFlightGuard, TickTrigger, acquire, poll_until_ready, probe_fn,
};
pub use error::{Error, Result};
