// src/bin/bench.rs
//
// Policy benchmark runner.
//
// Runs the bound calculators and policy simulations on a demo matching
// instance, prints per-metric lines, and writes a JSON summary (plus an
// optional JSONL per-trial log).
//
// Run examples:
//   cargo run --bin bench -- --trials 50 --horizon 200 --seed 1
//   cargo run --bin bench -- --trials 100 --budget-secs 60 --trial-log trials.jsonl

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use dynmatch::config::HarnessConfig;
use dynmatch::harness::Harness;
use dynmatch::logging::FileSink;
use dynmatch::one_way::{OneWaySpec, OneWayState};
use dynmatch::process::{InstanceSpec, MatchingState};
use dynmatch::results::MetricValue;
use dynmatch::types::OutcomeMode;

#[derive(Debug, Parser)]
#[command(
    name = "bench",
    about = "Dynmatch policy evaluation harness",
    version
)]
struct Args {
    /// Number of independent trials per policy.
    #[arg(long, default_value_t = 50)]
    trials: usize,

    /// Base seed. Trial i of each operation uses seed + i.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Decision epochs in the demo instance horizon.
    #[arg(long, default_value_t = 100)]
    horizon: u32,

    /// Request types in the demo instance.
    #[arg(long, default_value_t = 4)]
    types: usize,

    /// Resources in the demo instance. This is also the harness
    /// horizon parameter L.
    #[arg(long, default_value_t = 3)]
    resources: usize,

    /// Per-trial wall-clock budget in seconds.
    #[arg(long, default_value_t = 600)]
    budget_secs: u64,

    /// Exclude aborted trials from means instead of folding them in
    /// as the -1 sentinel.
    #[arg(long)]
    tagged_outcomes: bool,

    /// Also run the myopic and one-way simulations (outside run()).
    #[arg(long)]
    all_policies: bool,

    /// Output directory for the JSON summary.
    #[arg(long, default_value = "runs/bench")]
    output_dir: PathBuf,

    /// Optional JSONL per-trial log (relative to output-dir).
    #[arg(long)]
    trial_log: Option<PathBuf>,

    /// Suppress per-metric lines; only write files.
    #[arg(long)]
    quiet: bool,
}

/// Benchmark summary output (versioned schema).
#[derive(Debug, Serialize)]
struct BenchSummary {
    schema_version: u32,
    dynmatch_version: String,
    config: BenchConfig,
    metrics: Vec<MetricLine>,
}

#[derive(Debug, Serialize)]
struct BenchConfig {
    trials: usize,
    seed: u64,
    horizon: u32,
    types: usize,
    resources: usize,
    budget_secs: u64,
    tagged_outcomes: bool,
}

#[derive(Debug, Serialize)]
struct MetricLine {
    key: String,
    value: MetricValue,
}

/// Write a file atomically (temp file + rename).
fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    let temp_name = format!(
        ".tmp_{}_{}",
        std::process::id(),
        path.file_name()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default()
    );
    let temp_path = parent.join(&temp_name);

    let mut file = File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = HarnessConfig {
        trial_time_budget: Duration::from_secs(args.budget_secs),
        outcome_mode: if args.tagged_outcomes {
            OutcomeMode::Tagged
        } else {
            OutcomeMode::SentinelCompat
        },
        ..HarnessConfig::default()
    };

    let spec = InstanceSpec::demo(args.types, args.resources, args.horizon);
    let master = MatchingState::new(spec, args.seed);
    let mut harness = Harness::with_config(master, args.resources, config);

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating output dir {}", args.output_dir.display()))?;

    if let Some(rel) = args.trial_log.as_ref() {
        let path = if rel.is_absolute() {
            rel.clone()
        } else {
            args.output_dir.join(rel)
        };
        let sink = FileSink::create(&path)
            .with_context(|| format!("creating trial log {}", path.display()))?;
        harness.set_sink(Box::new(sink));
    }

    if !args.quiet {
        println!(
            "dynmatch-bench v{} | trials={} seed={} horizon={} types={} resources={} budget={}s",
            env!("CARGO_PKG_VERSION"),
            args.trials,
            args.seed,
            args.horizon,
            args.types,
            args.resources,
            args.budget_secs
        );
    }

    harness.compute_column_generation_upper_bound(false);
    harness.run(args.trials, args.seed)?;

    if args.all_policies {
        harness.simulate_myopic(args.trials, args.seed)?;
        let ow = OneWayState::new(OneWaySpec::demo(args.resources, args.horizon), args.seed);
        harness.simulate_one_way_lp(args.trials, ow, args.seed)?;
    }

    let mut metrics = Vec::new();
    for (key, value) in harness.results().iter() {
        if !args.quiet {
            match value {
                MetricValue::Scalar(v) => println!("  {key:<22} {v:>12.4}"),
                MetricValue::Series(vs) => println!("  {key:<22} {vs:?}"),
            }
        }
        metrics.push(MetricLine {
            key: key.to_string(),
            value: value.clone(),
        });
    }

    let summary = BenchSummary {
        schema_version: 1,
        dynmatch_version: env!("CARGO_PKG_VERSION").to_string(),
        config: BenchConfig {
            trials: args.trials,
            seed: args.seed,
            horizon: args.horizon,
            types: args.types,
            resources: args.resources,
            budget_secs: args.budget_secs,
            tagged_outcomes: args.tagged_outcomes,
        },
        metrics,
    };

    let summary_path = args.output_dir.join("bench_summary.json");
    let summary_json =
        serde_json::to_string_pretty(&summary).context("serializing bench_summary.json")?;
    atomic_write(&summary_path, summary_json.as_bytes())
        .with_context(|| format!("writing {}", summary_path.display()))?;

    if !args.quiet {
        println!();
        println!("Wrote: {}", summary_path.display());
    }

    Ok(())
}
