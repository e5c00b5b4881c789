// src/harness.rs
//
// Evaluation harness: drives N independent seeded trials per policy
// under a wall-clock budget, aggregates outcomes, and writes every
// metric into the instance-owned results store.
//
// Trial protocol (shared by every simulate operation):
// 1. start the trial timer
// 2. deep-clone the master process state, seeded `i + seed_offset`
// 3. construct the policy around the clone (variant constructors may
//    precompute; that work is not covered by the budget check)
// 4. loop decide/advance until the horizon empties, aborting the trial
//    if the budget trips (accumulated reward discarded)
// 5. mean over all N outcomes, aborted trials included per the
//    configured outcome mode
//
// Trials are embarrassingly parallel (independent clones, independent
// seeds); this implementation keeps them sequential and collects
// outcomes before the single results-store write.

use std::time::Instant;

use anyhow::{ensure, Result};

use crate::config::HarnessConfig;
use crate::logging::{NoopSink, TrialRecord, TrialSink};
use crate::metrics::TrialStats;
use crate::one_way::{OneWayLpPolicy, OneWayState};
use crate::policy::affine::{solve_affine_relaxation, solve_column_generation_integer};
use crate::policy::dlp::solve_deterministic_lp;
use crate::policy::{AffinePolicy, DlpPolicy, LookaheadPolicy, MyopicPolicy, Policy};
use crate::process::MatchingState;
use crate::results::{keys, ResultsStore};
use crate::types::{OutcomeMode, Seed, TrialOutcome};

/// Outcomes of one batch of trials, before aggregation.
#[derive(Debug, Clone)]
pub struct TrialReport {
    pub outcomes: Vec<TrialOutcome>,
    /// Separation-cut counts emitted by 2-resource affine dual steps,
    /// across all trials. Diagnostic only.
    pub cut_counts: Vec<u32>,
}

impl TrialReport {
    /// Aggregate mean per the outcome mode. In sentinel mode every
    /// outcome enters the sum, aborts as `-1.0`; in tagged mode only
    /// completed trials enter. An empty report means 0 in either mode.
    pub fn mean(&self, mode: OutcomeMode) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        match mode {
            OutcomeMode::SentinelCompat => {
                let sum: f64 = self.outcomes.iter().map(TrialOutcome::sentinel_value).sum();
                sum / self.outcomes.len() as f64
            }
            OutcomeMode::Tagged => self.stats().mean(),
        }
    }

    pub fn aborted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_aborted()).count()
    }

    pub fn stats(&self) -> TrialStats {
        let mut stats = TrialStats::default();
        for o in &self.outcomes {
            stats.record(*o);
        }
        stats
    }
}

/// Run `n` independent trials of the policy produced by `factory`.
///
/// Trial `i` is seeded `seed_offset + i`; the factory builds the policy
/// (including any clone of the master state) for that seed. Exposed so
/// stub policies can exercise the loop protocol directly.
pub fn run_policy_trials<P, F>(
    config: &HarnessConfig,
    sink: &mut dyn TrialSink,
    op: &str,
    n: usize,
    seed_offset: Seed,
    mut factory: F,
) -> Result<TrialReport>
where
    P: Policy,
    F: FnMut(Seed) -> Result<P>,
{
    ensure!(n >= 1, "{op}: trial count must be at least 1, got {n}");

    let mut outcomes = Vec::with_capacity(n);
    let mut cut_counts = Vec::new();

    for i in 0..n {
        let started = Instant::now();
        let trial_seed = seed_offset.wrapping_add(i as Seed);
        let mut policy = factory(trial_seed)?;

        let mut lb = 0.0;
        let mut steps = 0usize;
        let mut aborted = false;

        while policy.remaining_epochs() > 0 {
            if started.elapsed() >= config.trial_time_budget {
                aborted = true;
                break;
            }
            let step = policy.decide_step();
            lb += step.reward;
            if let Some(c) = step.cuts {
                cut_counts.push(c);
            }
            policy.advance();
            steps += 1;
        }

        let outcome = if aborted {
            TrialOutcome::Aborted
        } else {
            TrialOutcome::Completed(lb)
        };
        sink.log_trial(&TrialRecord {
            op,
            trial: i,
            seed: trial_seed,
            outcome,
            steps,
        });
        outcomes.push(outcome);
    }

    Ok(TrialReport {
        outcomes,
        cut_counts,
    })
}

/// Harness instance: owns the master process state, the horizon
/// parameter L, the configuration, and the results store.
pub struct Harness {
    master: MatchingState,
    l: usize,
    config: HarnessConfig,
    results: ResultsStore,
    sink: Box<dyn TrialSink>,
}

impl Harness {
    pub fn new(master: MatchingState, l: usize) -> Self {
        Self::with_config(master, l, HarnessConfig::default())
    }

    pub fn with_config(master: MatchingState, l: usize, config: HarnessConfig) -> Self {
        Self {
            master,
            l,
            config,
            results: ResultsStore::new(),
            sink: Box::new(NoopSink),
        }
    }

    /// Replace the telemetry sink (e.g. with a JSONL `FileSink`).
    pub fn set_sink(&mut self, sink: Box<dyn TrialSink>) {
        self.sink = sink;
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn master(&self) -> &MatchingState {
        &self.master
    }

    pub fn results(&self) -> &ResultsStore {
        &self.results
    }

    pub fn results_mut(&mut self) -> &mut ResultsStore {
        &mut self.results
    }

    // ----- Bound calculators -------------------------------------------------

    /// Affine-relaxation upper bound; writes `alp_ub`.
    pub fn compute_affine_upper_bound(&mut self) -> f64 {
        let ub = solve_affine_relaxation(&self.master, self.l);
        self.results.set_scalar(keys::ALP_UB, ub);
        ub
    }

    /// Integer column-generation upper bound; writes `cg_ub`. The
    /// verbosity flag only affects solver-side diagnostics on stderr.
    pub fn compute_column_generation_upper_bound(&mut self, verbose: bool) -> f64 {
        let ub = solve_column_generation_integer(&self.master, self.l, verbose);
        self.results.set_scalar(keys::CG_UB, ub);
        ub
    }

    /// Deterministic-LP upper bound; writes `dlp_ub`.
    pub fn compute_deterministic_lp_upper_bound(&mut self) -> f64 {
        let ub = solve_deterministic_lp(&self.master);
        self.results.set_scalar(keys::DLP_UB, ub);
        ub
    }

    // ----- Policy simulations ------------------------------------------------

    /// Affine dual simulation; writes `alp_dual_lb`.
    pub fn simulate_affine_dual(&mut self, n: usize, seed: Seed) -> Result<f64> {
        let master = self.master.clone();
        let l = self.l;
        self.simulate_op(keys::ALP_DUAL_LB, n, seed, move |s| {
            Ok(AffinePolicy::dual(master.clone_for_trial(s), l))
        })
    }

    /// Affine primal simulation, re-solving each step; writes
    /// `alp_primal_lb`.
    pub fn simulate_affine_primal_resolving(&mut self, n: usize, seed: Seed) -> Result<f64> {
        let master = self.master.clone();
        let l = self.l;
        self.simulate_op(keys::ALP_PRIMAL_LB, n, seed, move |s| {
            Ok(AffinePolicy::primal_resolving(master.clone_for_trial(s), l))
        })
    }

    /// Affine primal simulation with a precomputed value table; writes
    /// `alp_primal_lb_no_re`. The table build happens inside policy
    /// construction, outside the per-step budget checks.
    pub fn simulate_affine_primal_non_resolving(&mut self, n: usize, seed: Seed) -> Result<f64> {
        let master = self.master.clone();
        let l = self.l;
        self.simulate_op(keys::ALP_PRIMAL_LB_NO_RE, n, seed, move |s| {
            Ok(AffinePolicy::primal_non_resolving(
                master.clone_for_trial(s),
                l,
            ))
        })
    }

    /// Myopic simulation. Writes `alp_primal_lb_no_re`, sharing the key
    /// with the non-resolving affine primal: invoking both overwrites.
    /// Kept for parity with the published interface.
    pub fn simulate_myopic(&mut self, n: usize, seed: Seed) -> Result<f64> {
        let master = self.master.clone();
        self.simulate_op(keys::ALP_PRIMAL_LB_NO_RE, n, seed, move |s| {
            Ok(MyopicPolicy::new(master.clone_for_trial(s)))
        })
    }

    /// Limited-lookahead simulation; writes `lla_lb`. Ensures `alp_ub`
    /// is present first (compute-if-absent), once per call, before any
    /// trial starts.
    pub fn simulate_limited_lookahead(&mut self, n: usize, seed: Seed) -> Result<f64> {
        let master = &self.master;
        let l = self.l;
        self.results
            .get_or_compute(keys::ALP_UB, || Ok(solve_affine_relaxation(master, l)))?;

        let master = self.master.clone();
        let depth = self.config.lookahead_depth;
        self.simulate_op(keys::LLA_LB, n, seed, move |s| {
            Ok(LookaheadPolicy::new(master.clone_for_trial(s), depth))
        })
    }

    /// Deterministic-LP simulation, re-solving the relaxation every
    /// step; writes `dlp_lb`. Distinct from the standalone bound.
    pub fn simulate_deterministic_lp(&mut self, n: usize, seed: Seed) -> Result<f64> {
        let master = self.master.clone();
        self.simulate_op(keys::DLP_LB, n, seed, move |s| {
            Ok(DlpPolicy::new(master.clone_for_trial(s)))
        })
    }

    /// One-way LP simulation over a separate instance. Solves the LP
    /// exactly once, stores its bound under `olp_ub` (single-element
    /// series), then deep-clones the solved policy per trial, reseeding
    /// only the RNG; writes the mean under `olp_lb`.
    pub fn simulate_one_way_lp(
        &mut self,
        n: usize,
        instance: OneWayState,
        seed: Seed,
    ) -> Result<f64> {
        let olp = OneWayLpPolicy::solve(instance)?;
        self.results
            .set_series(keys::OLP_UB, vec![olp.upper_bound()]);

        self.simulate_op(keys::OLP_LB, n, seed, move |s| Ok(olp.clone_for_trial(s)))
    }

    /// Convenience composition: both static bounds plus the five
    /// matching-policy simulations, all under the same seed offset.
    /// Myopic and one-way are excluded.
    pub fn run(&mut self, n: usize, seed: Seed) -> Result<()> {
        self.compute_affine_upper_bound();
        self.compute_deterministic_lp_upper_bound();
        self.simulate_affine_dual(n, seed)?;
        self.simulate_affine_primal_resolving(n, seed)?;
        self.simulate_affine_primal_non_resolving(n, seed)?;
        self.simulate_limited_lookahead(n, seed)?;
        self.simulate_deterministic_lp(n, seed)?;
        Ok(())
    }

    /// Shared trial-batch driver: run, aggregate per the configured
    /// outcome mode, write the metric.
    fn simulate_op<P, F>(&mut self, key: &str, n: usize, seed_offset: Seed, factory: F) -> Result<f64>
    where
        P: Policy,
        F: FnMut(Seed) -> Result<P>,
    {
        let report = run_policy_trials(
            &self.config,
            self.sink.as_mut(),
            key,
            n,
            seed_offset,
            factory,
        )?;
        let mean = report.mean(self.config.outcome_mode);
        self.results.set_scalar(key, mean);
        Ok(mean)
    }
}
