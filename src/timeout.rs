//! # Expiry Policies
//!
//! Strategies deciding when a registration stops being dispatchable. A
//! policy is a pure value: it computes expiry from the registration's
//! `created_at`/`last_used_at` instants and never suspends. Use counting
//! (`max_uses`) lives on the registration itself and expires it regardless
//! of the policy variant.

use std::time::Duration;

use tokio::time::Instant;

/// Default expiry window applied when a registration doesn't pick one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Expiry strategy for a single registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// The registration never times out on its own.
    Never,

    /// Expires at `created_at + duration` regardless of use.
    Fixed(Duration),

    /// Expires at `last_used_at + duration`; every successful dispatch
    /// pushes the deadline back.
    Sliding(Duration),
}

impl Timeout {
    /// The instant this policy expires at, given the registration's
    /// timestamps, or [`None`] for [`Timeout::Never`].
    pub fn expires_at(&self, created_at: Instant, last_used_at: Instant) -> Option<Instant> {
        match self {
            Self::Never => None,
            Self::Fixed(duration) => Some(created_at + *duration),
            Self::Sliding(duration) => Some(last_used_at + *duration),
        }
    }

    /// Whether the policy has expired at `now`.
    pub fn is_expired(&self, created_at: Instant, last_used_at: Instant, now: Instant) -> bool {
        match self.expires_at(created_at, last_used_at) {
            Some(deadline) => now > deadline,
            None => false,
        }
    }

    /// Whether a successful dispatch refreshes the deadline.
    pub const fn refreshes_on_use(&self) -> bool {
        matches!(self, Self::Sliding(_))
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Self::Sliding(DEFAULT_TIMEOUT)
    }
}
