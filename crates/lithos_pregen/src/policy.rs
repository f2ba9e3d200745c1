//! # Failure Policy
//!
//! Decides when failed coordinates turn a run into a failed run.
//!
//! - `max_failures`: breached as soon as `failed > max_failures`. Checked on
//!   every failure; a breach stops dispatch immediately.
//! - `max_failure_rate`: breached when `failed / total > max_failure_rate`.
//!   Checked once, after the last coordinate.
//! - Neither set: the run fails only if every coordinate failed.

use serde::{Deserialize, Serialize};

/// Failure tolerance for a pregeneration run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailurePolicy {
    /// Largest tolerated number of failed coordinates.
    pub max_failures: Option<u64>,
    /// Largest tolerated fraction of failed coordinates, in [0, 1].
    pub max_failure_rate: Option<f64>,
}

impl FailurePolicy {
    /// Tolerates up to `max` failures.
    #[must_use]
    pub const fn max_failures(max: u64) -> Self {
        Self {
            max_failures: Some(max),
            max_failure_rate: None,
        }
    }

    /// Tolerates failures up to `rate` of the total.
    #[must_use]
    pub const fn max_failure_rate(rate: f64) -> Self {
        Self {
            max_failures: None,
            max_failure_rate: Some(rate),
        }
    }

    /// Returns true if neither limit is configured.
    #[must_use]
    pub const fn is_unset(&self) -> bool {
        self.max_failures.is_none() && self.max_failure_rate.is_none()
    }

    /// Checked after every failure.
    #[must_use]
    pub fn breached_early(&self, failed: u64) -> bool {
        self.max_failures.is_some_and(|max| failed > max)
    }

    /// Checked once every coordinate has a result.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn breached_final(&self, failed: u64, total: u64) -> bool {
        if self.is_unset() {
            return total > 0 && failed == total;
        }
        if self.breached_early(failed) {
            return true;
        }
        match self.max_failure_rate {
            Some(rate) if total > 0 => failed as f64 / total as f64 > rate,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_limit_is_exclusive() {
        let policy = FailurePolicy::max_failures(2);
        assert!(!policy.breached_early(2));
        assert!(policy.breached_early(3));
        assert!(!policy.breached_final(2, 9));
    }

    #[test]
    fn test_rate_limit_only_at_end() {
        let policy = FailurePolicy::max_failure_rate(0.2);
        assert!(!policy.breached_early(1_000));
        assert!(!policy.breached_final(1, 9));
        assert!(policy.breached_final(2, 9));
    }

    #[test]
    fn test_unset_fails_only_on_total_failure() {
        let policy = FailurePolicy::default();
        assert!(policy.is_unset());
        assert!(!policy.breached_early(100));
        assert!(!policy.breached_final(8, 9));
        assert!(policy.breached_final(9, 9));
        assert!(!policy.breached_final(0, 0));
    }

    #[test]
    fn test_both_limits() {
        let policy = FailurePolicy {
            max_failures: Some(10),
            max_failure_rate: Some(0.5),
        };
        assert!(policy.breached_final(6, 10));
        assert!(!policy.breached_final(5, 10));
    }
}
