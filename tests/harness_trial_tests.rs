// tests/harness_trial_tests.rs
//
// Trial-loop protocol tests driven through stub policies, plus the
// concrete end-to-end scenario on the real affine dual policy.

use anyhow::Result;
use dynmatch::config::HarnessConfig;
use dynmatch::harness::{run_policy_trials, Harness};
use dynmatch::logging::NoopSink;
use dynmatch::process::{InstanceSpec, MatchingState};
use dynmatch::results::keys;
use dynmatch::types::{OutcomeMode, StepReward};
use dynmatch::Policy;

/// Stub policy paying a fixed reward per step, no process state.
struct StubPolicy {
    remaining: usize,
    reward: f64,
}

impl Policy for StubPolicy {
    fn remaining_epochs(&self) -> usize {
        self.remaining
    }

    fn decide_step(&mut self) -> StepReward {
        StepReward::plain(self.reward)
    }

    fn advance(&mut self) {
        self.remaining -= 1;
    }
}

fn run_stub(n: usize, horizon: usize, reward: f64) -> Result<dynmatch::TrialReport> {
    let cfg = HarnessConfig::default();
    let mut sink = NoopSink;
    run_policy_trials(&cfg, &mut sink, "stub", n, 0, |_seed| {
        Ok(StubPolicy {
            remaining: horizon,
            reward,
        })
    })
}

#[test]
fn fixed_reward_stub_returns_reward_times_horizon() {
    for n in [1, 2, 5] {
        for h in [1, 3, 10] {
            let report = run_stub(n, h, 2.5).unwrap();
            let mean = report.mean(OutcomeMode::SentinelCompat);
            assert_eq!(mean, 2.5 * h as f64, "n={n} h={h}");
        }
    }
}

#[test]
fn single_trial_returns_the_trial_outcome_unaveraged() {
    let report = run_stub(1, 7, -0.25).unwrap();
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.mean(OutcomeMode::SentinelCompat), -1.75);
}

#[test]
fn zero_trials_rejected_as_invalid_argument() {
    let cfg = HarnessConfig::default();
    let mut sink = NoopSink;
    let err = run_policy_trials(&cfg, &mut sink, "stub", 0, 0, |_seed| {
        Ok(StubPolicy {
            remaining: 1,
            reward: 1.0,
        })
    })
    .unwrap_err();
    assert!(err.to_string().contains("at least 1"));
}

#[test]
fn factory_sees_offset_plus_index_seeds() {
    let cfg = HarnessConfig::default();
    let mut sink = NoopSink;
    let mut seeds = Vec::new();
    run_policy_trials(&cfg, &mut sink, "stub", 4, 100, |seed| {
        seeds.push(seed);
        Ok(StubPolicy {
            remaining: 1,
            reward: 0.0,
        })
    })
    .unwrap();
    assert_eq!(seeds, vec![100, 101, 102, 103]);
}

// ----- End-to-end scenarios on the real policies ---------------------------

/// Instance where every epoch pays exactly 1: one certain request type,
/// unit reward, ample capacity, no departures.
fn unit_reward_master(horizon: u32) -> MatchingState {
    let spec = InstanceSpec {
        reward: vec![vec![1.0]],
        capacity: vec![100],
        arrival_rates: vec![1.0],
        departure_rate: 0.0,
        horizon_len: horizon,
    };
    MatchingState::new(spec, 0)
}

#[test]
fn affine_dual_on_unit_instance_scores_the_horizon() {
    // Horizon 3, reward 1 per step, N = 2, seed 0: mean is exactly 3.0.
    let mut h = Harness::new(unit_reward_master(3), 1);
    let result = h.simulate_affine_dual(2, 0).unwrap();
    assert_eq!(result, 3.0);
    assert_eq!(h.results().scalar(keys::ALP_DUAL_LB), Some(3.0));
}

#[test]
fn simulations_are_bit_identical_for_identical_seeds() {
    let spec = InstanceSpec::demo(3, 3, 15);
    let mut a = Harness::new(MatchingState::new(spec.clone(), 11), 3);
    let mut b = Harness::new(MatchingState::new(spec, 11), 3);

    let ra = a.simulate_affine_dual(4, 9).unwrap();
    let rb = b.simulate_affine_dual(4, 9).unwrap();
    assert_eq!(ra.to_bits(), rb.to_bits());

    let ra = a.simulate_deterministic_lp(4, 9).unwrap();
    let rb = b.simulate_deterministic_lp(4, 9).unwrap();
    assert_eq!(ra.to_bits(), rb.to_bits());

    let ra = a.simulate_limited_lookahead(4, 9).unwrap();
    let rb = b.simulate_limited_lookahead(4, 9).unwrap();
    assert_eq!(ra.to_bits(), rb.to_bits());
}

#[test]
fn different_seed_offsets_change_stochastic_results() {
    // Demo instance has uncertain arrivals, so different seed offsets
    // should produce different trajectories somewhere across policies.
    let spec = InstanceSpec::demo(4, 3, 40);
    let mut a = Harness::new(MatchingState::new(spec.clone(), 5), 3);
    let mut b = Harness::new(MatchingState::new(spec, 5), 3);

    let ra = a.simulate_myopic(3, 0).unwrap();
    let rb = b.simulate_myopic(3, 1000).unwrap();
    assert_ne!(ra.to_bits(), rb.to_bits());
}
