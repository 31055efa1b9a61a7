// ── Runtime coordinator configuration ──
//
// Describes how often and how long to poll. It carries the session token
// but never touches disk: the CLI builds a `CoordinatorConfig` from its
// profile and hands it in.

use std::time::Duration;

use secrecy::SecretString;

/// Default cadence of scheduled refreshes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Default deadline for one complete refresh cycle.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(20);

/// Configuration for one coordinator (one account).
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Time between scheduled refreshes. Zero disables the scheduler.
    pub refresh_interval: Duration,
    /// Deadline covering the whole fan-out of one refresh.
    pub refresh_timeout: Duration,
    /// Persisted session token, validated by `first_refresh`.
    pub token: SecretString,
}

impl CoordinatorConfig {
    /// Configuration with default timings for the given token.
    pub fn new(token: SecretString) -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            token,
        }
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }
}
