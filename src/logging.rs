// src/logging.rs
//
// Telemetry sinks for the harness.
// - TrialSink: trait invoked once per completed or aborted trial
// - NoopSink:  discards all events
// - FileSink:  writes one JSON line per trial for offline analysis

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::types::{Seed, TrialOutcome};

/// One trial's telemetry record.
#[derive(Debug, Clone, Serialize)]
pub struct TrialRecord<'a> {
    /// Operation that ran the trial (e.g. `alp_dual_lb`).
    pub op: &'a str,
    /// Trial index within the operation, 0-based.
    pub trial: usize,
    pub seed: Seed,
    pub outcome: TrialOutcome,
    /// Decision steps executed before completion or abort.
    pub steps: usize,
}

/// Abstract sink for per-trial telemetry.
pub trait TrialSink {
    fn log_trial(&mut self, record: &TrialRecord<'_>);
}

/// Sink that discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl TrialSink for NoopSink {
    fn log_trial(&mut self, _record: &TrialRecord<'_>) {
        // intentionally no-op
    }
}

/// JSONL file sink: each trial is one JSON object on its own line.
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    /// Create a new sink writing to `path`.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl TrialSink for FileSink {
    fn log_trial(&mut self, record: &TrialRecord<'_>) {
        // Telemetry must never fail a run; drop the line on error.
        if let Ok(line) = serde_json::to_string(record) {
            let _ = writeln!(self.writer, "{line}");
            let _ = self.writer.flush();
        }
    }
}
