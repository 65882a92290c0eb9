//! Pure transformations for chunked transfers.
//!
//! Header interpretation and payload assembly. Nothing here touches the
//! network or spawns tasks.

mod assemble;
mod headers;

pub use assemble::assemble;
pub use headers::{parse_length, total_hint};
