// tests/timeout_tests.rs
//
// Wall-clock budget semantics: with the budget forced to zero every
// trial aborts before its first decision, and the aggregate degrades
// to the sentinel (or the tagged abort count, depending on mode).

use dynmatch::config::HarnessConfig;
use dynmatch::harness::Harness;
use dynmatch::process::{InstanceSpec, MatchingState};
use dynmatch::results::keys;
use dynmatch::types::{OutcomeMode, TIMEOUT_SENTINEL};

fn zero_budget_harness(mode: OutcomeMode) -> Harness {
    let mut cfg = HarnessConfig::zero_budget();
    cfg.outcome_mode = mode;
    let master = MatchingState::new(InstanceSpec::demo(3, 3, 20), 1);
    Harness::with_config(master, 3, cfg)
}

#[test]
fn zero_budget_yields_sentinel_for_any_policy_and_n() {
    for n in [1, 3, 10] {
        let mut h = zero_budget_harness(OutcomeMode::SentinelCompat);
        assert_eq!(h.simulate_affine_dual(n, 0).unwrap(), TIMEOUT_SENTINEL);
        assert_eq!(h.simulate_myopic(n, 0).unwrap(), TIMEOUT_SENTINEL);
        assert_eq!(h.simulate_deterministic_lp(n, 0).unwrap(), TIMEOUT_SENTINEL);
        assert_eq!(
            h.simulate_affine_primal_resolving(n, 0).unwrap(),
            TIMEOUT_SENTINEL
        );
    }
}

#[test]
fn zero_budget_n3_writes_sentinel_metric() {
    // Concrete scenario: budget 0, N = 3, result is exactly -1.0.
    let mut h = zero_budget_harness(OutcomeMode::SentinelCompat);
    let result = h.simulate_limited_lookahead(3, 0).unwrap();
    assert_eq!(result, -1.0);
    assert_eq!(h.results().scalar(keys::LLA_LB), Some(-1.0));
}

#[test]
fn tagged_mode_reports_aborts_instead_of_sentinel() {
    let mut h = zero_budget_harness(OutcomeMode::Tagged);
    let result = h.simulate_myopic(4, 0).unwrap();
    // No completed trials: tagged mean is zero, not the sentinel.
    assert_eq!(result, 0.0);
}

#[test]
fn aborted_trial_discards_accumulated_reward() {
    // The abort check runs before each decision, so under a zero
    // budget no reward can leak into the outcome even on an instance
    // where every step pays.
    let spec = InstanceSpec {
        reward: vec![vec![1.0]],
        capacity: vec![100],
        arrival_rates: vec![1.0],
        departure_rate: 0.0,
        horizon_len: 5,
    };
    let mut cfg = HarnessConfig::zero_budget();
    cfg.outcome_mode = OutcomeMode::SentinelCompat;
    let mut h = Harness::with_config(MatchingState::new(spec, 0), 1, cfg);
    assert_eq!(h.simulate_affine_dual(2, 0).unwrap(), TIMEOUT_SENTINEL);
}
