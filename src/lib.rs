//! Dynmatch core library.
//!
//! This crate evaluates sequential decision-making policies for a
//! stochastic dynamic-matching problem and compares their realized
//! performance against LP-derived upper bounds. The binary
//! (`src/bin/bench.rs`) is just a thin research harness around these
//! components.
//!
//! # Architecture
//!
//! - **Process state** (`process`, `one_way`): the remaining decision
//!   horizon plus a seeded random source; one master instance, deep-
//!   cloned per trial with a fresh seed.
//!
//! - **Policies** (`policy`): interchangeable one-step decision
//!   strategies (affine dual/primal, myopic, limited lookahead,
//!   deterministic LP, one-way LP) behind a single `Policy` trait.
//!
//! - **Harness** (`harness`): the trial protocol — N seeded trials per
//!   policy under a wall-clock budget, aggregated into the
//!   instance-owned results store.
//!
//! - **Results store** (`results`): named-metric map with an explicit
//!   compute-if-absent memoization contract.
//!
//! All simulated values are deterministic given the master state and
//! the seed offset: trial `i` always runs under seed `offset + i`.

pub mod config;
pub mod harness;
pub mod logging;
pub mod metrics;
pub mod one_way;
pub mod policy;
pub mod process;
pub mod results;
pub mod types;

// --- Re-exports for ergonomic external use ---------------------------------

pub use config::{HarnessConfig, DEFAULT_TRIAL_BUDGET_SECS};
pub use harness::{run_policy_trials, Harness, TrialReport};
pub use logging::{FileSink, NoopSink, TrialRecord, TrialSink};
pub use metrics::TrialStats;
pub use one_way::{OneWayLpPolicy, OneWaySpec, OneWayState};
pub use policy::{AffinePolicy, DlpPolicy, FluidSolution, LookaheadPolicy, MyopicPolicy, Policy};
pub use process::{InstanceSpec, MatchingState};
pub use results::{keys, MetricValue, ResultsStore};
pub use types::{EpochId, OutcomeMode, Seed, StepReward, TrialOutcome, TIMEOUT_SENTINEL};
