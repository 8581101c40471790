//! Activity retry policy.

use std::time::Duration;

/// Exponential-backoff retry policy applied to each activity execution.
///
/// `maximum_attempts` counts the first execution; a policy of 2 means
/// one retry after the initial failure.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub backoff_coefficient: f64,
    pub maximum_attempts: u32,
}

impl RetryPolicy {
    pub fn new(initial_interval: Duration, backoff_coefficient: f64, maximum_attempts: u32) -> Self {
        Self {
            initial_interval,
            backoff_coefficient,
            maximum_attempts,
        }
    }

    /// Backoff before the attempt following `completed_attempts` failures.
    pub fn delay(&self, completed_attempts: u32) -> Duration {
        let exponent = completed_attempts.saturating_sub(1);
        self.initial_interval
            .mul_f64(self.backoff_coefficient.powi(exponent as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_series_grows_by_coefficient() {
        let policy = RetryPolicy::new(Duration::from_millis(500), 1.5, 3);

        assert_eq!(policy.delay(1), Duration::from_millis(500));
        assert_eq!(policy.delay(2), Duration::from_millis(750));
        assert_eq!(policy.delay(3), Duration::from_millis(1125));
    }

    #[test]
    fn test_delay_first_attempt_uses_initial_interval() {
        let policy = RetryPolicy::new(Duration::from_secs(1), 2.0, 2);
        // completed_attempts is 1-based; 0 is clamped
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(1), Duration::from_secs(1));
    }
}
