//! Timers, spawned loops and probe calls.

mod poll;
mod single_flight;
mod ticker;
mod watchdog;

pub use poll::{AcquireHandle, Acquirer, acquire, poll_until_ready};
pub use single_flight::{Flight, FlightLease, FlightPermit, SingleFlightGroup, SingleFlightGuard};
pub use ticker::{CancellableTicker, TickTrigger};
pub use watchdog::{DualConditionWatchdog, Probe, ProbeFn, probe_fn};
