/// Bytes received so far in one transfer.
///
/// `loaded` never decreases within a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Running total of body bytes received.
    pub loaded: u64,

    /// Expected payload size, if the response announced one.
    ///
    /// `None` when the server sent no usable length, e.g. a compressed body
    /// without an `X-File-Size` header.
    pub total: Option<u64>,
}

impl Progress {
    pub fn new(loaded: u64, total: Option<u64>) -> Self { Self { loaded, total } }

    /// Calculate the percentage of completion.
    ///
    /// Returns `None` if `total` is unknown.
    #[must_use]
    pub fn percentage(&self) -> Option<f64> {
        self.total.map(|total| {
            if total == 0 {
                100.0
            } else {
                (self.loaded as f64 / total as f64) * 100.0
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        assert_eq!(Progress::new(300, Some(1000)).percentage(), Some(30.0));
        assert_eq!(Progress::new(1000, Some(1000)).percentage(), Some(100.0));
        assert_eq!(Progress::new(0, Some(0)).percentage(), Some(100.0));
        assert_eq!(Progress::new(512, None).percentage(), None);
    }
}
