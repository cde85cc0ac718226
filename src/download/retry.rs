//! Retry policy with bounded linear or exponential backoff.
//!
//! This module provides the [`RetryPolicy`] and [`FailureType`] types for
//! classifying fetch failures and determining retry behavior.
//!
//! # Overview
//!
//! Every failed attempt is classified into a [`FailureType`]:
//! - [`FailureType::Transient`] - transport failures and 5xx responses
//! - [`FailureType::RateLimited`] - HTTP 429
//! - [`FailureType::Permanent`] - everything else (4xx, unhandled 3xx, other 2xx)
//!
//! The [`RetryPolicy`] then decides whether to retry based on failure type
//! and the zero-based attempt number, and how long to sleep first.
//!
//! # Example
//!
//! ```
//! use go_installer::download::{RetryDecision, RetryPolicy, classify_status};
//!
//! let policy = RetryPolicy::default();
//!
//! match policy.should_retry(classify_status(503), 0) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("Retrying in {:?} (attempt {})", delay, attempt);
//!     }
//!     RetryDecision::DoNotRetry { reason } => {
//!         println!("Not retrying: {}", reason);
//!     }
//! }
//! ```

use std::time::Duration;

use tracing::{debug, instrument};

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for backoff (2 seconds).
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Default maximum delay cap (60 seconds).
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Classification of fetch failure types.
///
/// Used to determine whether a failed attempt should be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry.
    ///
    /// Examples: connection refused, timeout, 500, 502, 503.
    Transient,

    /// Server rate limiting (HTTP 429).
    RateLimited,

    /// Failure that won't succeed regardless of retries.
    ///
    /// Examples: 404 Not Found, 403 Forbidden, a redirect refused by policy.
    Permanent,
}

/// Shape of the delay curve between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// `base * (n + 1)`
    Linear,
    /// `base * multiplier^n`
    Exponential {
        /// Growth factor per attempt.
        multiplier: f32,
    },
}

/// Decision on whether to retry a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Zero-based number of the next attempt.
        attempt: u32,
    },

    /// Do not retry.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Configuration for retry behavior.
///
/// # Default Values
///
/// - `max_retries`: 3 (so 4 attempts in total)
/// - `base_delay`: 2 seconds
/// - `max_delay`: 60 seconds
/// - `backoff`: [`Backoff::Linear`]
///
/// With defaults the delays between attempts are 2s, 4s, 6s.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    max_retries: u32,

    /// Base delay for backoff.
    base_delay: Duration,

    /// Maximum delay cap.
    max_delay: Duration,

    /// Delay curve.
    backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff: Backoff::Linear,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy with custom settings.
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration, backoff: Backoff) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: DEFAULT_MAX_DELAY.max(base_delay),
            backoff,
        }
    }

    /// Creates a policy with a custom retry count, using defaults for other settings.
    #[must_use]
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Creates a policy that retries without sleeping. Intended for tests.
    #[must_use]
    pub fn without_delay(max_retries: u32) -> Self {
        Self::new(max_retries, Duration::ZERO, Backoff::Linear)
    }

    /// Returns the configured retry count.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the total number of attempts (`max_retries + 1`).
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Returns the base backoff delay.
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Returns the delay curve.
    #[must_use]
    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Determines whether to retry a failed attempt.
    ///
    /// `attempt` is the zero-based number of the attempt that just failed.
    #[instrument(skip(self), fields(max_retries = self.max_retries))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_retries {
            debug!(attempt, max = self.max_retries, "max retries reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max retries ({}) exhausted", self.max_retries),
            };
        }

        let delay = self.delay_for(attempt);

        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// Calculates the delay to sleep after attempt `attempt` failed.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = match self.backoff {
            Backoff::Linear => self.base_delay.saturating_mul(attempt.saturating_add(1)),
            Backoff::Exponential { multiplier } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let factor = f64::from(multiplier).powi(exponent);
                Duration::try_from_secs_f64(self.base_delay.as_secs_f64() * factor)
                    .unwrap_or(self.max_delay)
            }
        };
        delay.min(self.max_delay)
    }
}

/// Classifies a non-200 HTTP status.
///
/// | Status | Type |
/// |--------|------|
/// | 429 | RateLimited |
/// | 500..=599 (and above) | Transient |
/// | anything else | Permanent |
#[must_use]
pub fn classify_status(status: u16) -> FailureType {
    match status {
        429 => FailureType::RateLimited,
        status if status >= 500 => FailureType::Transient,
        _ => FailureType::Permanent,
    }
}

/// Classifies a transport error.
///
/// Connection failures, timeouts, and body errors are transient. A request
/// that could not be built, or a redirect refused by the client's redirect
/// policy, will fail identically on every attempt.
#[must_use]
pub fn classify_transport_error(error: &reqwest::Error) -> FailureType {
    if error.is_builder() || error.is_redirect() {
        FailureType::Permanent
    } else {
        FailureType::Transient
    }
}
