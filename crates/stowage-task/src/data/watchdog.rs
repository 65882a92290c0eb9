use std::fmt;

/// Lifecycle of a [`DualConditionWatchdog`](crate::DualConditionWatchdog).
///
/// `Idle → Armed` on start, `Armed → Triggered` after enough consecutive
/// unhealthy samples, and any state back to `Idle` on stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchdogState {
    #[default]
    Idle,
    Armed,
    Triggered,
}

impl fmt::Display for WatchdogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchdogState::Idle => write!(f, "Idle"),
            WatchdogState::Armed => write!(f, "Armed"),
            WatchdogState::Triggered => write!(f, "Triggered"),
        }
    }
}

/// One joined observation of both probes. Not retained after it is folded
/// into the strike window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchdogSample {
    pub auth_valid:       bool,
    pub delegation_valid: bool,
}

impl WatchdogSample {
    pub fn new(auth_valid: bool, delegation_valid: bool) -> Self {
        Self {
            auth_valid,
            delegation_valid,
        }
    }

    #[must_use]
    pub fn is_healthy(&self) -> bool { self.auth_valid && self.delegation_valid }
}

/// Delivered to subscribers once per armed period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogEvent {
    /// Both conditions did not hold for the configured number of
    /// consecutive samples. Carries the sample that completed the streak.
    Triggered(WatchdogSample),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_health() {
        assert!(WatchdogSample::new(true, true).is_healthy());
        assert!(!WatchdogSample::new(true, false).is_healthy());
        assert!(!WatchdogSample::new(false, true).is_healthy());
        assert!(!WatchdogSample::new(false, false).is_healthy());
    }
}
