use bytes::Bytes;

use crate::data::progress::Progress;
use crate::error::Error;

/// The assembled payload of a finished transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    pub bytes:        Bytes,
    pub content_type: Option<String>,
}

/// What a transfer publishes: any number of `Progress` events, then exactly
/// one terminal `Complete` or `Failed`. Cancellation publishes nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    Progress(Progress),
    Complete(Completed),
    Failed(Error),
}

impl TransferEvent {
    /// `true` for `Complete` and `Failed`.
    #[must_use]
    pub fn is_terminal(&self) -> bool { !matches!(self, TransferEvent::Progress(_)) }
}
