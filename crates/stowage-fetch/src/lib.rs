//! Chunked HTTP transfers with progress, built on a single read of the body.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Requests, response metadata, progress and events
//! - [`core`] - Pure transformations (length hints, payload assembly)
//! - `effects` - I/O operations behind the [`HttpClient`] trait
//!
//! # Key Features
//!
//! - **Single read**: [`tee`] feeds the progress reporter and the body
//!   collector from one pull loop over the response
//! - **Single flight**: [`TransferPipeline`] shares one transfer among all
//!   callers asking for the same key, replaying earlier events to late joiners
//! - **Silent cancellation**: cancelling a [`TransferHandle`] ends its stream
//!   without an error; the transfer stops once nobody is attached

pub mod core;
pub mod data;
mod effects;
mod error;

pub use data::{ChunkReadResult, Completed, Progress, ResponseMeta, TransferEvent, TransferOptions, TransferRequest};
pub use effects::{
    BoxStream, Broadcaster, ChunkReader, FetchResponse, HttpClient, Tap, TransferHandle, TransferPipeline, tee,
};
#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;
pub use error::{Error, Result};
