// src/types.rs
//
// Core shared types for the dynmatch harness:
// - type aliases for seeds and epochs
// - StepReward: one-step policy decision output
// - TrialOutcome / OutcomeMode: tagged trial results with an optional
//   sentinel-compatible numeric projection

use serde::{Deserialize, Serialize};

/// Seed for a trial's random source. Trial `i` under seed offset `s`
/// is always seeded as `s + i`.
pub type Seed = u64;

/// One decision epoch in a trial horizon.
pub type EpochId = u32;

/// Sentinel written in place of a trial reward when the trial aborts on
/// the wall-clock budget. Shares the value space with legitimate
/// (possibly negative) rewards; see `OutcomeMode`.
pub const TIMEOUT_SENTINEL: f64 = -1.0;

/// Result of a single policy decision step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepReward {
    /// Reward collected by this decision.
    pub reward: f64,
    /// Separation-cut count emitted by the 2-resource affine dual step.
    /// Diagnostic only; never feeds the reward metric.
    pub cuts: Option<u32>,
}

impl StepReward {
    pub fn plain(reward: f64) -> Self {
        Self { reward, cuts: None }
    }

    pub fn with_cuts(reward: f64, cuts: u32) -> Self {
        Self {
            reward,
            cuts: Some(cuts),
        }
    }
}

/// Outcome of one independent trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TrialOutcome {
    /// Trial ran to horizon exhaustion; carries the accumulated reward.
    Completed(f64),
    /// Trial exceeded the wall-clock budget. Any reward accumulated
    /// before the abort is discarded, not partially counted.
    Aborted,
}

impl TrialOutcome {
    pub fn is_aborted(&self) -> bool {
        matches!(self, TrialOutcome::Aborted)
    }

    /// Numeric projection used for aggregation in sentinel mode.
    pub fn sentinel_value(&self) -> f64 {
        match self {
            TrialOutcome::Completed(r) => *r,
            TrialOutcome::Aborted => TIMEOUT_SENTINEL,
        }
    }
}

/// How aborted trials enter the aggregate mean.
///
/// `SentinelCompat` reproduces the historical convention: an aborted
/// trial contributes `-1.0` to the sum, indistinguishable from a
/// legitimately negative reward. `Tagged` excludes aborted trials from
/// the mean and reports the abort count separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutcomeMode {
    #[default]
    SentinelCompat,
    Tagged,
}
