// src/config.rs
//
// Harness configuration.
//
// The per-trial budget defaults to 600 s but is ordinary configuration,
// so tests can force it to zero and callers can tighten it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::OutcomeMode;

/// Default per-trial wall-clock budget (seconds).
pub const DEFAULT_TRIAL_BUDGET_SECS: u64 = 600;

/// Configuration for a `Harness` instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Wall-clock budget for a single trial, measured from trial start.
    /// A trial that overruns it aborts immediately and discards any
    /// reward accumulated so far. There is no sub-step timeout: a hang
    /// inside one decision solve is not interruptible.
    pub trial_time_budget: Duration,

    /// How aborted trials enter the aggregate mean.
    pub outcome_mode: OutcomeMode,

    /// Lookahead depth (epochs) for the limited-lookahead policy.
    pub lookahead_depth: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            trial_time_budget: Duration::from_secs(DEFAULT_TRIAL_BUDGET_SECS),
            outcome_mode: OutcomeMode::default(),
            lookahead_depth: 3,
        }
    }
}

impl HarnessConfig {
    /// Config with a zero budget: every trial aborts on its first
    /// budget check. Used by timeout tests.
    pub fn zero_budget() -> Self {
        Self {
            trial_time_budget: Duration::ZERO,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget_is_600s() {
        let cfg = HarnessConfig::default();
        assert_eq!(cfg.trial_time_budget, Duration::from_secs(600));
        assert_eq!(cfg.outcome_mode, OutcomeMode::SentinelCompat);
    }

    #[test]
    fn zero_budget_keeps_other_defaults() {
        let cfg = HarnessConfig::zero_budget();
        assert_eq!(cfg.trial_time_budget, Duration::ZERO);
        assert_eq!(cfg.lookahead_depth, HarnessConfig::default().lookahead_depth);
    }
}
