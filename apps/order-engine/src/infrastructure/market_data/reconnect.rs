//! Reconnection Policy with Exponential Backoff and Jitter

use std::time::Duration;

use rand::Rng;

use super::StreamConfig;

/// Exponential backoff with full jitter: each delay is drawn uniformly from
/// `[0, min(max, initial * multiplier^attempt))`.
#[derive(Debug)]
pub struct ReconnectPolicy {
    initial_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
    max_attempts: u32,
    current_attempt: u32,
}

impl ReconnectPolicy {
    /// Create a policy from stream settings.
    #[must_use]
    pub const fn new(config: &StreamConfig) -> Self {
        Self::with_params(
            config.initial_backoff,
            config.max_backoff,
            config.backoff_multiplier,
            config.max_reconnect_attempts,
        )
    }

    /// Create with custom parameters.
    #[must_use]
    pub const fn with_params(
        initial_backoff: Duration,
        max_backoff: Duration,
        multiplier: f64,
        max_attempts: u32,
    ) -> Self {
        Self {
            initial_backoff,
            max_backoff,
            multiplier,
            max_attempts,
            current_attempt: 0,
        }
    }

    /// Next delay, or `None` once the attempts are used up.
    #[must_use]
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if self.current_attempt >= self.max_attempts {
            return None;
        }

        let base_ms = self.initial_backoff.as_millis() as f64;
        let exponential = base_ms
            * self
                .multiplier
                .powi(i32::try_from(self.current_attempt).unwrap_or(i32::MAX));
        let capped = exponential.min(self.max_backoff.as_millis() as f64);

        self.current_attempt += 1;

        // random_range panics on an empty range
        if capped <= 0.0 {
            return Some(Duration::ZERO);
        }
        let jitter = rand::rng().random_range(0.0..capped);
        Some(Duration::from_millis(jitter as u64))
    }

    /// Forget past failures once a connection is up again.
    pub const fn reset(&mut self) {
        self.current_attempt = 0;
    }

    /// Attempts made since the last reset.
    #[must_use]
    pub const fn current_attempt(&self) -> u32 {
        self.current_attempt
    }

    /// Whether another attempt is allowed.
    #[must_use]
    pub const fn should_reconnect(&self) -> bool {
        self.current_attempt < self.max_attempts
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(&StreamConfig::default())
    }
}
