//! Immutable data types for chunked transfers.
//!
//! Requests, response metadata, progress snapshots and the events a transfer
//! publishes. None of these types perform I/O.

pub mod event;
pub mod options;
pub mod progress;
pub mod request;
pub mod response;

pub use event::{Completed, TransferEvent};
pub use options::TransferOptions;
pub use progress::Progress;
pub use request::TransferRequest;
pub use response::{ChunkReadResult, ResponseMeta};
