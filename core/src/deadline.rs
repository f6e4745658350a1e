//! Cooperative cancellation token. Every engine primitive accepts one and
//! must propagate it to the backend call unchanged (spec §9).

use std::time::{Duration, Instant};

/// A point in time by which an operation must complete. Cheap to copy,
/// cheap to check.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// A deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
        }
    }

    /// The standard single-row read/write deadline (spec §4.E: 5s).
    pub fn single_row() -> Self {
        Self::after(Duration::from_secs(5))
    }

    /// The standard list/bulk operation deadline (spec §4.E: 10s).
    pub fn bulk() -> Self {
        Self::after(Duration::from_secs(10))
    }

    /// The liveness-check deadline used during pool initialization (spec §4.C: 5s).
    pub fn liveness() -> Self {
        Self::after(Duration::from_secs(5))
    }

    /// A deadline that has already passed; useful in tests.
    pub fn expired() -> Self {
        Self {
            at: Instant::now() - Duration::from_millis(1),
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Time remaining, or `Duration::ZERO` if already expired.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn deadline_instant(&self) -> Instant {
        self.at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_deadline_reports_zero_remaining() {
        let d = Deadline::expired();
        assert!(d.is_expired());
        assert_eq!(d.remaining(), Duration::ZERO);
    }

    #[test]
    fn fresh_deadline_has_remaining_time() {
        let d = Deadline::after(Duration::from_secs(5));
        assert!(!d.is_expired());
        assert!(d.remaining() > Duration::from_secs(4));
    }
}
