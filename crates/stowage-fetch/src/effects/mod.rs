//! I/O for chunked transfers.
//!
//! The HTTP capability, the pull-based body reader, the tee that fans one
//! read out to several consumers, and the pipeline tying them together.

mod broadcast;
mod handle;
mod http;
mod pipeline;
mod reader;

pub use broadcast::{Broadcaster, Tap, tee};
pub use handle::TransferHandle;
pub use http::{BoxStream, FetchResponse, HttpClient};
#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
pub use pipeline::TransferPipeline;
pub use reader::ChunkReader;
