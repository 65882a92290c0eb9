//! Error types for stowage-fetch.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The connection failed or dropped while opening or reading the body.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status before any bytes were read.
    #[error("server responded with status {0}")]
    Status(u16),

    /// The caller cancelled. Never published as a `Failed` event.
    #[error("transfer cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn transport(e: impl std::fmt::Display) -> Self { Error::Transport(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, Error>;
