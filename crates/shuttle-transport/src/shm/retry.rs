use std::time::Duration;

/// Linear backoff schedule for attaching to a host-created segment.
///
/// The host creates the segment and the worker attaches to it, with no
/// ordering between the two, so the first few attempts may legitimately
/// miss. After failed attempt `n` (zero-based) the accessor sleeps
/// `base_delay + step × n` before trying again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub attempts: u32,
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
    /// Extra delay added for every further failed attempt.
    pub step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: shuttle_config::DEFAULT_ATTACH_ATTEMPTS,
            base_delay: Duration::from_millis(shuttle_config::DEFAULT_ATTACH_BASE_DELAY_MS),
            step: Duration::from_millis(shuttle_config::DEFAULT_ATTACH_STEP_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Builds the policy from loaded configuration.
    #[must_use]
    pub const fn from_config(config: &shuttle_config::Config) -> Self {
        Self {
            attempts: config.attach_attempts(),
            base_delay: config.attach_base_delay(),
            step: config.attach_step_delay(),
        }
    }

    /// A policy that retries `attempts` times without sleeping.
    #[must_use]
    pub const fn immediate(attempts: u32) -> Self {
        Self {
            attempts,
            base_delay: Duration::ZERO,
            step: Duration::ZERO,
        }
    }

    /// Delay to wait after failed attempt `attempt` (zero-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_add(self.step.saturating_mul(attempt))
    }
}
