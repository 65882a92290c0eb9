use serde::{Deserialize, Serialize};

/// Configuration for a [`TransferPipeline`](crate::TransferPipeline).
///
/// # Examples
///
/// ```
/// use stowage_fetch::TransferOptions;
///
/// let options = TransferOptions::default().buffer_capacity(16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferOptions {
    /// Chunks each tee branch may hold before the body reader waits for
    /// that branch to catch up.
    ///
    /// Default: 64
    pub buffer_capacity: usize,
}

impl Default for TransferOptions {
    fn default() -> Self { Self { buffer_capacity: 64 } }
}

impl TransferOptions {
    #[must_use]
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(1);
        self
    }
}
