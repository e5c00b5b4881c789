// src/one_way.rs
//
// One-way LP policy over its own process-state type.
//
// Structurally unlike every other variant: the fractional LP is solved
// exactly once, globally, before any trial. Each trial then deep-clones
// the entire solved policy, reseeds only the RNG, and plays randomized
// decisions obtained by decomposing the fixed fractional solution into
// per-trip acceptance probabilities.
//
// The concrete problem is one-way resource movement: a trip request
// (origin, destination) consumes a unit of stock at the origin and
// deposits it at the destination.

use std::collections::VecDeque;

use anyhow::{ensure, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::policy::Policy;
use crate::types::{EpochId, Seed, StepReward};

/// Static problem data for a one-way instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneWaySpec {
    /// Reward for serving a trip from origin `o` to destination `d`.
    pub reward: Vec<Vec<f64>>,
    /// Initial stock per location.
    pub stock: Vec<u32>,
    /// Per-epoch arrival probability of each (origin, destination)
    /// trip request. Total must not exceed 1.
    pub arrival_rates: Vec<Vec<f64>>,
    /// Number of decision epochs.
    pub horizon_len: u32,
}

impl OneWaySpec {
    /// Deterministic demo instance: a small ring of locations where
    /// forward trips pay more than backward ones.
    pub fn demo(n_locations: usize, horizon_len: u32) -> Self {
        let n = n_locations.max(2);
        let reward = (0..n)
            .map(|o| {
                (0..n)
                    .map(|d| {
                        if o == d {
                            0.0
                        } else if (o + 1) % n == d {
                            8.0
                        } else {
                            3.0
                        }
                    })
                    .collect()
            })
            .collect();
        let total_pairs = (n * (n - 1)) as f64;
        let rate = 0.8 / total_pairs;
        let arrival_rates = (0..n)
            .map(|o| {
                (0..n)
                    .map(|d| if o == d { 0.0 } else { rate })
                    .collect()
            })
            .collect();
        Self {
            reward,
            stock: vec![(horizon_len / (2 * n as u32)).max(1); n],
            arrival_rates,
            horizon_len,
        }
    }

    pub fn n_locations(&self) -> usize {
        self.stock.len()
    }
}

/// Mutable per-trial one-way process state. Same horizon/RNG contract
/// as `MatchingState`, different problem structure.
#[derive(Debug, Clone)]
pub struct OneWayState {
    spec: OneWaySpec,
    horizon: VecDeque<EpochId>,
    stock: Vec<u32>,
    pending: Option<(usize, usize)>,
    rng: ChaCha8Rng,
}

impl OneWayState {
    pub fn new(spec: OneWaySpec, seed: Seed) -> Self {
        let horizon = (0..spec.horizon_len).collect();
        let stock = spec.stock.clone();
        let mut state = Self {
            spec,
            horizon,
            stock,
            pending: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        state.pending = state.sample_trip();
        state
    }

    pub fn spec(&self) -> &OneWaySpec {
        &self.spec
    }

    pub fn horizon_len(&self) -> usize {
        self.horizon.len()
    }

    pub fn pending(&self) -> Option<(usize, usize)> {
        self.pending
    }

    pub fn stock(&self, location: usize) -> u32 {
        self.stock[location]
    }

    /// Serve the pending trip: move one unit from origin to
    /// destination and collect the reward.
    fn serve_pending(&mut self) -> Option<f64> {
        let (o, d) = self.pending?;
        if self.stock[o] == 0 {
            return None;
        }
        self.stock[o] -= 1;
        self.stock[d] += 1;
        self.pending = None;
        Some(self.spec.reward[o][d])
    }

    fn advance(&mut self) {
        if self.horizon.pop_front().is_none() {
            return;
        }
        self.pending = self.sample_trip();
    }

    fn sample_trip(&mut self) -> Option<(usize, usize)> {
        let u: f64 = self.rng.gen();
        let mut acc = 0.0;
        for (o, row) in self.spec.arrival_rates.iter().enumerate() {
            for (d, rate) in row.iter().enumerate() {
                acc += rate;
                if u < acc {
                    return Some((o, d));
                }
            }
        }
        None
    }
}

/// One-way LP policy: fixed fractional solution plus per-trial
/// randomized rounding.
#[derive(Debug, Clone)]
pub struct OneWayLpPolicy {
    state: OneWayState,
    /// Fractional service volume y[o][d] from the one-shot LP solve.
    y: Vec<Vec<f64>>,
    /// Acceptance probability per trip pair, the randomized-rounding
    /// decomposition of `y` against expected demand.
    accept_prob: Vec<Vec<f64>>,
    upper_bound: f64,
}

impl OneWayLpPolicy {
    /// Solve the one-way LP once, globally. Deterministic: expected
    /// demand per pair is allocated against origin stock by descending
    /// reward, and the acceptance probabilities are the served share
    /// of each pair's demand.
    pub fn solve(state: OneWayState) -> Result<Self> {
        let spec = state.spec();
        let n = spec.n_locations();
        ensure!(n >= 2, "one-way instance needs at least two locations");

        let h = state.horizon_len() as f64;
        let mut remaining: Vec<f64> = state.stock.iter().map(|&s| s as f64).collect();

        let mut pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|o| (0..n).map(move |d| (o, d)))
            .filter(|&(o, d)| o != d)
            .collect();
        pairs.sort_by(|a, b| {
            let ra = spec.reward[a.0][a.1];
            let rb = spec.reward[b.0][b.1];
            rb.partial_cmp(&ra)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(b))
        });

        let mut y = vec![vec![0.0; n]; n];
        let mut accept_prob = vec![vec![0.0; n]; n];
        let mut upper_bound = 0.0;

        for (o, d) in pairs {
            let demand = spec.arrival_rates[o][d] * h;
            if demand <= 0.0 {
                continue;
            }
            let serve = demand.min(remaining[o]);
            if serve <= 0.0 {
                continue;
            }
            y[o][d] = serve;
            remaining[o] -= serve;
            upper_bound += serve * spec.reward[o][d];
            accept_prob[o][d] = (serve / demand).clamp(0.0, 1.0);
        }

        Ok(Self {
            state,
            y,
            accept_prob,
            upper_bound,
        })
    }

    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    pub fn fractional_solution(&self) -> &[Vec<f64>] {
        &self.y
    }

    /// Deep-clone the already-solved policy for one trial, reseeding
    /// only the RNG. The fractional solution and acceptance
    /// probabilities are reused untouched.
    pub fn clone_for_trial(&self, seed: Seed) -> Self {
        let mut clone = self.clone();
        clone.state.rng = ChaCha8Rng::seed_from_u64(seed);
        clone
    }
}

impl Policy for OneWayLpPolicy {
    fn remaining_epochs(&self) -> usize {
        self.state.horizon_len()
    }

    /// Randomized decision from the fixed fractional solution: accept
    /// the pending trip with its decomposed probability.
    fn decide_step(&mut self) -> StepReward {
        let Some((o, d)) = self.state.pending() else {
            return StepReward::plain(0.0);
        };
        if self.state.stock(o) == 0 {
            return StepReward::plain(0.0);
        }

        let p = self.accept_prob[o][d];
        let u: f64 = self.state.rng.gen();
        if u < p {
            StepReward::plain(self.state.serve_pending().unwrap_or(0.0))
        } else {
            StepReward::plain(0.0)
        }
    }

    fn advance(&mut self) {
        self.state.advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_policy(seed: Seed) -> OneWayLpPolicy {
        OneWayLpPolicy::solve(OneWayState::new(OneWaySpec::demo(3, 30), seed)).unwrap()
    }

    #[test]
    fn upper_bound_positive_and_capped_by_stock() {
        let p = demo_policy(0);
        assert!(p.upper_bound() > 0.0);

        let spec = p.state.spec();
        let max_reward = spec
            .reward
            .iter()
            .flatten()
            .fold(0.0_f64, |m, &r| m.max(r));
        let total_stock: u32 = spec.stock.iter().sum();
        assert!(p.upper_bound() <= max_reward * total_stock as f64 + 1e-9);
    }

    #[test]
    fn acceptance_probabilities_are_valid() {
        let p = demo_policy(0);
        for row in &p.accept_prob {
            for &pr in row {
                assert!((0.0..=1.0).contains(&pr));
            }
        }
    }

    #[test]
    fn trial_clones_reuse_solution_and_differ_only_in_rng() {
        let p = demo_policy(7);
        let a = p.clone_for_trial(1);
        let b = p.clone_for_trial(2);
        assert_eq!(a.fractional_solution(), b.fractional_solution());
        assert_eq!(a.upper_bound(), b.upper_bound());

        let mut a1 = p.clone_for_trial(5);
        let mut a2 = p.clone_for_trial(5);
        let mut total1 = 0.0;
        let mut total2 = 0.0;
        while a1.remaining_epochs() > 0 {
            total1 += a1.decide_step().reward;
            a1.advance();
            total2 += a2.decide_step().reward;
            a2.advance();
        }
        assert_eq!(total1, total2);
    }

    #[test]
    fn certain_demand_and_full_acceptance_serves_every_trip() {
        // One pair with certain arrivals and ample stock: the LP serves
        // all demand, so acceptance probability is 1 and every epoch
        // pays out.
        let spec = OneWaySpec {
            reward: vec![vec![0.0, 5.0], vec![0.0, 0.0]],
            stock: vec![100, 0],
            arrival_rates: vec![vec![0.0, 1.0], vec![0.0, 0.0]],
            horizon_len: 10,
        };
        let mut p = OneWayLpPolicy::solve(OneWayState::new(spec, 0)).unwrap();
        let mut total = 0.0;
        while p.remaining_epochs() > 0 {
            total += p.decide_step().reward;
            p.advance();
        }
        assert!((total - 50.0).abs() < 1e-9);
    }
}
