//! Pacing of outbound FRED requests
//!
//! The category cache pauses once before every network fetch. The pause is
//! a policy object so the production fixed delay can be swapped for a zero
//! or recording throttle in tests.

use async_trait::async_trait;
use std::time::Duration;

/// Delay FRED is given between category requests unless configured otherwise
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// A pause taken before each outbound request
#[async_trait]
pub trait Throttle: Send + Sync {
    async fn pause(&self);
}

/// Sleeps for a fixed duration before every request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// A throttle that never sleeps
    pub fn none() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

#[async_trait]
impl Throttle for FixedDelay {
    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}
