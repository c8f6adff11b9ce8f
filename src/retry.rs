use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Backoff schedule between attempts of an adaptive retry loop.
///
/// The loop itself lives with its caller because each attempt's request
/// depends on how the previous one failed; this type only decides how long
/// to wait before attempt `n`.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first one)
    pub max_attempts: u32,
    /// Initial delay before the first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff (e.g., 2.0 doubles the delay each time)
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Create a new retry configuration
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }

    /// Set the maximum delay between retries
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Set the backoff multiplier
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Preset: translation escalation loop.
    /// One initial attempt plus `retries` escalated ones.
    /// Delays after transport failures: 250ms, 500ms, 1s, capped at 2s.
    pub fn escalation(retries: u32) -> Self {
        Self::new(retries.saturating_add(1), Duration::from_millis(250))
            .with_max_delay(Duration::from_secs(2))
            .with_backoff_multiplier(2.0)
    }

    /// Calculate the delay for a given attempt number (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let delay_ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi((attempt - 1) as i32);

        let delay = Duration::from_millis(delay_ms as u64);
        delay.min(self.max_delay)
    }

    /// Sleep for the delay preceding `attempt`, if any.
    pub async fn pause_before(&self, attempt: u32, operation_name: &str) {
        let delay = self.delay_for_attempt(attempt);
        if delay.is_zero() {
            return;
        }
        debug!(
            "{}: Retry attempt {}/{} after {:?}",
            operation_name,
            attempt + 1,
            self.max_attempts,
            delay
        );
        sleep(delay).await;
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::escalation(2)
    }
}
