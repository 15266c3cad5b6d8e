//! Polling parameters.

use std::time::Duration;

/// Default delay between two status fetches of the same task.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(800);

/// Tunable parameters for the status poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Suspension between the end of one fetch and the start of the next.
    pub interval: Duration,
}

impl PollConfig {
    pub fn from_millis(millis: u64) -> Self {
        Self {
            interval: Duration::from_millis(millis),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_interval_is_800ms() {
        assert_eq!(PollConfig::default().interval, Duration::from_millis(800));
    }

    #[test]
    fn from_millis() {
        assert_eq!(PollConfig::from_millis(750).interval.as_millis(), 750);
    }
}
