//! Configuration types for verification runs

use std::time::Duration;

/// Default number of cases described concurrently
pub const DEFAULT_MAX_PARALLEL: usize = 4;

/// Default fetch attempts per case (one try plus two retries)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default first backoff delay
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(2);

/// Default backoff ceiling
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(30);

/// Delay between fetch attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    /// `base * 2^(retry-1)`, capped at `max`
    Exponential { base: Duration, max: Duration },
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::Exponential {
            base: DEFAULT_BACKOFF_BASE,
            max: DEFAULT_BACKOFF_MAX,
        }
    }
}

impl Backoff {
    /// Delay before retry number `retry` (1-based). Retry 0 waits nothing.
    ///
    /// With base=2s, max=30s:
    /// - Retry 1: 2s
    /// - Retry 2: 4s
    /// - Retry 3: 8s
    /// - Retry 4: 16s
    /// - Retry 5+: 30s (capped)
    pub fn delay(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        match *self {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { base, max } => {
                let multiplier = 2u32.saturating_pow(retry - 1);
                base.saturating_mul(multiplier).min(max)
            }
        }
    }
}

/// Bounded retry for transient fetch failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; values below 1 are treated as 1
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::default(),
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::Fixed(Duration::ZERO),
        }
    }

    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed(delay),
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Configuration for one verification run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Upper bound on concurrently verified cases
    pub max_parallel: usize,
    /// Overall deadline; unresolved cases are reported as timed out
    pub deadline: Option<Duration>,
    pub retry: RetryPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_parallel: DEFAULT_MAX_PARALLEL,
            deadline: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl RunConfig {
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
