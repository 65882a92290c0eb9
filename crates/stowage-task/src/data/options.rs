use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for [`poll_until_ready`](crate::poll_until_ready) and
/// [`Acquirer`](crate::Acquirer).
///
/// # Examples
///
/// ```
/// use stowage_task::PollOptions;
/// use std::time::Duration;
///
/// let options = PollOptions::default()
///     .interval(Duration::from_secs(2))
///     .max_attempts(Some(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollOptions {
    /// Delay between an empty answer and the next query.
    ///
    /// Default: 500ms
    pub interval: Duration,

    /// Upper bound on query invocations.
    ///
    /// `None` polls until a value appears or the caller cancels; bounding
    /// the wait is otherwise the caller's job.
    ///
    /// Default: None
    pub max_attempts: Option<u32>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval:     Duration::from_millis(500),
            max_attempts: None,
        }
    }
}

impl PollOptions {
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// Configuration for [`DualConditionWatchdog`](crate::DualConditionWatchdog).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogOptions {
    /// Sampling cadence. The first sample is taken one interval after start.
    ///
    /// Default: 1s
    pub interval: Duration,

    /// Number of consecutive unhealthy samples that fire the trigger.
    /// Values below 1 are treated as 1.
    ///
    /// Default: 2
    pub strikes: usize,
}

impl Default for WatchdogOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            strikes:  2,
        }
    }
}

impl WatchdogOptions {
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn strikes(mut self, strikes: usize) -> Self {
        self.strikes = strikes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_options_default() {
        let options = PollOptions::default();
        assert_eq!(options.interval, Duration::from_millis(500));
        assert_eq!(options.max_attempts, None);
    }

    #[test]
    fn test_watchdog_options_default() {
        let options = WatchdogOptions::default();
        assert_eq!(options.interval, Duration::from_secs(1));
        assert_eq!(options.strikes, 2);
    }

    #[test]
    fn test_options_deserialize_partial() {
        let options: WatchdogOptions = serde_json::from_str(r#"{"strikes": 3}"#).unwrap();
        assert_eq!(options.strikes, 3);
        assert_eq!(options.interval, Duration::from_secs(1));

        let options: PollOptions =
            serde_json::from_str(r#"{"interval": {"secs": 2, "nanos": 0}}"#).unwrap();
        assert_eq!(options.interval, Duration::from_secs(2));
        assert_eq!(options.max_attempts, None);
    }
}
