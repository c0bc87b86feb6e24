// Retry policy shared by every segment fetch
use crate::domain::errors::FetchError;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total fetch attempts per segment, including the first
    pub max_attempts: u32,
    /// Fixed delay after a render error
    pub backoff: Duration,
    /// Fixed delay after a render timeout
    pub timeout_backoff: Duration,
    /// Recreate the surface after render errors too, not only timeouts
    pub reset_surface_on_error: bool,
    /// Treat a fetched page without usable numbers as retryable
    pub retry_parse_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
            timeout_backoff: Duration::from_secs(5),
            reset_surface_on_error: true,
            retry_parse_errors: false,
        }
    }
}

impl RetryPolicy {
    pub fn has_attempts_left(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    pub fn backoff_for(&self, error: &FetchError) -> Duration {
        if error.is_timeout() {
            self.timeout_backoff
        } else {
            self.backoff
        }
    }

    /// A timed-out page is assumed hung and always discarded.
    pub fn resets_surface(&self, error: &FetchError) -> bool {
        error.is_timeout() || self.reset_surface_on_error
    }
}
