// src/policy/dlp.rs
//
// Deterministic-LP bound and the per-trial resolving DLP policy.
//
// The standalone bound solves the deterministic fluid relaxation once.
// The policy variant is distinct: it re-solves the same relaxation at
// every step of the trial loop and follows the rounded fractional
// solution for the pending request.

use crate::process::MatchingState;
use crate::types::StepReward;

use super::{solve_fluid, Policy};

/// Static deterministic-LP upper bound: one fluid solve over the full
/// remaining horizon, departures ignored.
pub fn solve_deterministic_lp(state: &MatchingState) -> f64 {
    solve_fluid(state).objective
}

#[derive(Debug, Clone)]
pub struct DlpPolicy {
    state: MatchingState,
}

impl DlpPolicy {
    pub fn new(state: MatchingState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &MatchingState {
        &self.state
    }
}

impl Policy for DlpPolicy {
    fn remaining_epochs(&self) -> usize {
        self.state.horizon_len()
    }

    /// Re-solve the deterministic relaxation, then accept the pending
    /// request on its largest fractional allocation if that allocation
    /// rounds up (>= 0.5 of one unit).
    fn decide_step(&mut self) -> StepReward {
        let Some(request) = self.state.pending() else {
            return StepReward::plain(0.0);
        };

        let sol = solve_fluid(&self.state);
        let n_resources = self.state.spec().n_resources();

        let mut best: Option<(usize, f64)> = None;
        for j in 0..n_resources {
            if self.state.capacity(j) == 0 {
                continue;
            }
            let alloc = sol.x[request][j];
            if best.map_or(true, |(_, a)| alloc > a) {
                best = Some((j, alloc));
            }
        }

        let reward = match best {
            Some((j, alloc)) if alloc >= 0.5 => self.state.commit_match(j).unwrap_or(0.0),
            _ => 0.0,
        };
        StepReward::plain(reward)
    }

    fn advance(&mut self) {
        self.state.advance();
    }
}
