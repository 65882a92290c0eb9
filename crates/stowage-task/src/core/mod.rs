//! Pure state kept by the pipelines, free of timers and I/O.

mod strike;

pub use strike::StrikeWindow;
