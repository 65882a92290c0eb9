//! Error types for stowage-task.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The readiness query itself failed. Never retried.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("cancelled by caller")]
    Cancelled,

    /// Only reachable when a polling bound has been configured.
    #[error("still not ready after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

impl Error {
    pub(crate) fn transport(e: impl std::fmt::Display) -> Self { Error::Transport(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, Error>;
