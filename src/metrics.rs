// src/metrics.rs
//
// Small online statistics for trial outcomes.
// - TrialStats: Welford running mean/variance + min/max over completed
//   trial rewards, plus an abort counter.
//
// Deterministic and order-independent in the mean (plain sum).

use crate::types::TrialOutcome;

#[derive(Debug, Clone, Copy)]
pub struct TrialStats {
    completed: u64,
    aborted: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for TrialStats {
    fn default() -> Self {
        Self {
            completed: 0,
            aborted: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl TrialStats {
    /// Record one trial outcome. Aborted trials only bump the abort
    /// counter; non-finite rewards are ignored.
    pub fn record(&mut self, outcome: TrialOutcome) {
        let x = match outcome {
            TrialOutcome::Completed(r) => r,
            TrialOutcome::Aborted => {
                self.aborted += 1;
                return;
            }
        };
        if !x.is_finite() {
            return;
        }

        self.completed += 1;
        self.min = self.min.min(x);
        self.max = self.max.max(x);

        // Welford online variance.
        let delta = x - self.mean;
        self.mean += delta / (self.completed as f64);
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn aborted(&self) -> u64 {
        self.aborted
    }

    /// Mean over completed trials only.
    pub fn mean(&self) -> f64 {
        if self.completed == 0 {
            0.0
        } else {
            self.mean
        }
    }

    pub fn min(&self) -> f64 {
        if self.completed == 0 {
            0.0
        } else {
            self.min
        }
    }

    pub fn max(&self) -> f64 {
        if self.completed == 0 {
            0.0
        } else {
            self.max
        }
    }

    /// Population variance (divide by n).
    pub fn variance_population(&self) -> f64 {
        if self.completed == 0 {
            0.0
        } else {
            self.m2 / (self.completed as f64)
        }
    }

    pub fn stddev_population(&self) -> f64 {
        self.variance_population().sqrt()
    }
}
