// src/process.rs
//
// Stochastic process state for the dynamic-matching problem.
//
// A `MatchingState` holds the remaining decision horizon, the seeded
// random source, and the problem data (per-pair rewards, per-resource
// capacities, arrival rates). The harness owns one master instance and
// deep-clones it at the start of every trial; the clone is mutated in
// place by `advance` and discarded at trial end.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::types::{EpochId, Seed};

/// Static problem data for a matching instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceSpec {
    /// Reward for matching request type `i` to resource `j`.
    pub reward: Vec<Vec<f64>>,
    /// Units of each resource available at the start of the horizon.
    pub capacity: Vec<u32>,
    /// Per-epoch arrival probability of each request type. The sum over
    /// types plus `departure_rate` must not exceed 1.
    pub arrival_rates: Vec<f64>,
    /// Per-epoch probability that one previously matched unit departs
    /// and frees its resource.
    pub departure_rate: f64,
    /// Number of decision epochs in the horizon.
    pub horizon_len: u32,
}

impl InstanceSpec {
    /// Small deterministic demo instance used by the bench binary and
    /// examples. Rewards decay with |i - j| so types prefer their "own"
    /// resource.
    pub fn demo(n_types: usize, n_resources: usize, horizon_len: u32) -> Self {
        let reward = (0..n_types)
            .map(|i| {
                (0..n_resources)
                    .map(|j| {
                        let dist = (i as f64 - j as f64).abs();
                        (10.0 - 2.0 * dist).max(1.0)
                    })
                    .collect()
            })
            .collect();

        let per_resource = ((horizon_len as usize / n_resources.max(1)) as u32).max(1);
        Self {
            reward,
            capacity: vec![per_resource; n_resources],
            arrival_rates: vec![0.8 / n_types.max(1) as f64; n_types],
            departure_rate: 0.05,
            horizon_len,
        }
    }

    pub fn n_types(&self) -> usize {
        self.arrival_rates.len()
    }

    pub fn n_resources(&self) -> usize {
        self.capacity.len()
    }
}

/// Mutable per-trial process state.
///
/// Cloning is a full deep copy (all fields are owned), so a trial clone
/// shares no mutable substructure with the master.
#[derive(Debug, Clone)]
pub struct MatchingState {
    spec: InstanceSpec,
    /// Remaining decision epochs, consumed front-first. Strictly
    /// shrinking within a trial; empty means normal termination.
    horizon: VecDeque<EpochId>,
    /// Remaining units per resource.
    capacity: Vec<u32>,
    /// Units currently matched per resource (departure candidates).
    loaded: Vec<u32>,
    /// Request type awaiting a decision, if any.
    pending: Option<usize>,
    rng: ChaCha8Rng,
    seed: Seed,
}

impl MatchingState {
    /// Build a master state. The seed is a constructor parameter: there
    /// is no window where the state exists with an unseeded RNG.
    pub fn new(spec: InstanceSpec, seed: Seed) -> Self {
        let horizon = (0..spec.horizon_len).collect();
        let capacity = spec.capacity.clone();
        let n_resources = spec.n_resources();
        let mut state = Self {
            spec,
            horizon,
            capacity,
            loaded: vec![0; n_resources],
            pending: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        };
        // The first decision epoch needs a request on the table.
        state.pending = state.sample_arrival();
        state
    }

    /// Deep-clone for one trial, replacing only the random source.
    /// Problem data, horizon, and the pending request carry over from
    /// the master so every trial starts from the same decision point.
    pub fn clone_for_trial(&self, seed: Seed) -> Self {
        let mut clone = self.clone();
        clone.rng = ChaCha8Rng::seed_from_u64(seed);
        clone.seed = seed;
        clone
    }

    pub fn spec(&self) -> &InstanceSpec {
        &self.spec
    }

    pub fn seed(&self) -> Seed {
        self.seed
    }

    pub fn horizon_len(&self) -> usize {
        self.horizon.len()
    }

    /// Snapshot of the remaining epochs, front (next) first.
    pub fn horizon(&self) -> Vec<EpochId> {
        self.horizon.iter().copied().collect()
    }

    pub fn pending(&self) -> Option<usize> {
        self.pending
    }

    pub fn capacity(&self, resource: usize) -> u32 {
        self.capacity[resource]
    }

    pub fn capacities(&self) -> &[u32] {
        &self.capacity
    }

    pub fn reward(&self, request: usize, resource: usize) -> f64 {
        self.spec.reward[request][resource]
    }

    /// Expected arrivals of `request` over the next `epochs` decision
    /// epochs. Fluid quantity consumed by the relaxation solves.
    pub fn expected_demand(&self, request: usize, epochs: f64) -> f64 {
        self.spec.arrival_rates[request] * epochs.max(0.0)
    }

    /// Match the pending request to `resource`, consuming one unit and
    /// returning the reward. `None` if there is no pending request or
    /// the resource is exhausted; the caller treats that as a skip.
    pub fn commit_match(&mut self, resource: usize) -> Option<f64> {
        let request = self.pending?;
        if resource >= self.capacity.len() || self.capacity[resource] == 0 {
            return None;
        }
        self.capacity[resource] -= 1;
        self.loaded[resource] += 1;
        self.pending = None;
        Some(self.spec.reward[request][resource])
    }

    /// Remove one unit of `resource` without matching anything.
    /// Used by lookahead probes on throwaway clones.
    pub fn debit_capacity(&mut self, resource: usize) {
        if resource < self.capacity.len() && self.capacity[resource] > 0 {
            self.capacity[resource] -= 1;
        }
    }

    /// Replace the pending request. Hook for tests and probes that
    /// need a specific decision point.
    pub fn force_pending(&mut self, request: usize) {
        self.pending = Some(request);
    }

    /// Advance the process by exactly one stochastic event, shrinking
    /// the horizon by one. An undecided pending request is dropped
    /// (a request not matched at its epoch leaves the system).
    pub fn advance(&mut self) {
        if self.horizon.pop_front().is_none() {
            return;
        }

        self.pending = self.sample_arrival();
    }

    /// Sample the next event from the seeded RNG: an arrival of some
    /// request type, a departure, or nothing.
    fn sample_arrival(&mut self) -> Option<usize> {
        let u: f64 = self.rng.gen();
        let mut acc = 0.0;
        for (i, rate) in self.spec.arrival_rates.iter().enumerate() {
            acc += rate;
            if u < acc {
                return Some(i);
            }
        }

        acc += self.spec.departure_rate;
        if u < acc {
            self.apply_departure();
        }
        None
    }

    /// One matched unit departs, freeing its resource. The departing
    /// resource is drawn from the same seeded RNG so trials stay
    /// reproducible.
    fn apply_departure(&mut self) {
        let total_loaded: u32 = self.loaded.iter().sum();
        if total_loaded == 0 {
            return;
        }
        let mut pick = self.rng.gen_range(0..total_loaded);
        for (j, count) in self.loaded.iter().enumerate() {
            if pick < *count {
                self.loaded[j] -= 1;
                self.capacity[j] += 1;
                return;
            }
            pick -= count;
        }
    }
}
