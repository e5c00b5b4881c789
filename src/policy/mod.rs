// src/policy/mod.rs
//
// Policy trait and shared relaxation machinery.
//
// A policy owns its trial's process-state clone plus any strategy
// internals (resolved relaxations, precomputed value tables). The
// harness drives it through repeated decide/advance cycles until the
// horizon empties or the trial budget trips.
//
// Key components:
// - Policy: one-step decision interface shared by every variant
// - FluidSolution / solve_fluid: deterministic fluid relaxation used as
//   the LP collaborator seam by the affine, lookahead, and DLP variants

use crate::process::MatchingState;
use crate::types::StepReward;

pub mod affine;
pub mod dlp;
pub mod lookahead;
pub mod myopic;

pub use affine::AffinePolicy;
pub use dlp::DlpPolicy;
pub use lookahead::LookaheadPolicy;
pub use myopic::MyopicPolicy;

/// One-step decision strategy driven by the harness trial loop.
pub trait Policy {
    /// Decision epochs this policy still has to play. The trial loop
    /// runs while this is non-zero.
    fn remaining_epochs(&self) -> usize;

    /// Make one decision on the current process state and return the
    /// reward it collected.
    fn decide_step(&mut self) -> StepReward;

    /// Advance the wrapped process state by exactly one stochastic
    /// event, shrinking the horizon by one.
    fn advance(&mut self);
}

/// Fractional solution of the fluid relaxation.
#[derive(Debug, Clone)]
pub struct FluidSolution {
    /// Fractional allocation x[i][j] of expected type-i demand to
    /// resource j.
    pub x: Vec<Vec<f64>>,
    /// Objective value; an upper bound on the remaining reward under
    /// the fluid approximation.
    pub objective: f64,
    /// Estimated dual value per resource: the lowest reward that still
    /// claimed a unit of the resource, zero if slack remains.
    pub duals: Vec<f64>,
}

/// Solve the fluid relaxation on the current state: expected remaining
/// demand `rate_i * H` allocated against remaining capacities by
/// descending reward. Deterministic, no randomness, tie-broken by
/// (type, resource) index.
///
/// This is the collaborator seam for the LP solves; the harness and
/// policies only consume the objective, allocation, and duals.
pub fn solve_fluid(state: &MatchingState) -> FluidSolution {
    solve_fluid_over(state, state.horizon_len() as f64)
}

/// Fluid relaxation over an explicit epoch count (used by the
/// limited-lookahead policy to truncate the horizon).
pub fn solve_fluid_over(state: &MatchingState, epochs: f64) -> FluidSolution {
    let spec = state.spec();
    let n_types = spec.n_types();
    let n_resources = spec.n_resources();

    let mut demand: Vec<f64> = (0..n_types)
        .map(|i| state.expected_demand(i, epochs))
        .collect();
    let mut cap: Vec<f64> = state.capacities().iter().map(|&c| c as f64).collect();

    let mut pairs: Vec<(usize, usize)> = (0..n_types)
        .flat_map(|i| (0..n_resources).map(move |j| (i, j)))
        .collect();
    pairs.sort_by(|a, b| {
        let ra = spec.reward[a.0][a.1];
        let rb = spec.reward[b.0][b.1];
        rb.partial_cmp(&ra)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(b))
    });

    let mut x = vec![vec![0.0; n_resources]; n_types];
    let mut objective = 0.0;
    let mut duals = vec![0.0; n_resources];

    for (i, j) in pairs {
        let take = demand[i].min(cap[j]);
        if take <= 0.0 {
            continue;
        }
        x[i][j] += take;
        demand[i] -= take;
        cap[j] -= take;
        objective += take * spec.reward[i][j];
        if cap[j] <= 1e-12 {
            // Resource saturated: its dual is the marginal reward that
            // closed it out.
            duals[j] = spec.reward[i][j];
        }
    }

    FluidSolution {
        x,
        objective,
        duals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::InstanceSpec;

    fn tiny_state() -> MatchingState {
        // One type, one resource, reward 4, capacity 2, certain arrival.
        let spec = InstanceSpec {
            reward: vec![vec![4.0]],
            capacity: vec![2],
            arrival_rates: vec![1.0],
            departure_rate: 0.0,
            horizon_len: 5,
        };
        MatchingState::new(spec, 0)
    }

    #[test]
    fn fluid_objective_capped_by_capacity() {
        let s = tiny_state();
        let sol = solve_fluid(&s);
        // Demand is 5 but only 2 units exist: objective = 2 * 4.
        assert!((sol.objective - 8.0).abs() < 1e-9);
        assert!((sol.x[0][0] - 2.0).abs() < 1e-9);
        // Saturated resource carries the closing reward as its dual.
        assert!((sol.duals[0] - 4.0).abs() < 1e-9);
    }

    #[test]
    fn fluid_objective_capped_by_demand() {
        let spec = InstanceSpec {
            reward: vec![vec![4.0]],
            capacity: vec![100],
            arrival_rates: vec![0.5],
            departure_rate: 0.0,
            horizon_len: 10,
        };
        let s = MatchingState::new(spec, 0);
        let sol = solve_fluid(&s);
        // Expected demand 5, ample capacity: objective = 5 * 4, dual 0.
        assert!((sol.objective - 20.0).abs() < 1e-9);
        assert_eq!(sol.duals[0], 0.0);
    }

    #[test]
    fn fluid_prefers_high_reward_pairs() {
        let spec = InstanceSpec {
            reward: vec![vec![1.0, 9.0]],
            capacity: vec![10, 1],
            arrival_rates: vec![0.2],
            departure_rate: 0.0,
            horizon_len: 10,
        };
        let s = MatchingState::new(spec, 0);
        let sol = solve_fluid(&s);
        // Demand 2: one unit on the scarce high-reward resource, the
        // remainder spills to the cheap one.
        assert!((sol.x[0][1] - 1.0).abs() < 1e-9);
        assert!((sol.x[0][0] - 1.0).abs() < 1e-9);
        assert!((sol.objective - 10.0).abs() < 1e-9);
    }
}
