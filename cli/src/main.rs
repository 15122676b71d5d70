use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use rotodrag::timeline::{LoadReport, Timeline, Timepoint};
use rotodrag::RotodragError;
use serde_json::{Map, Value};
use tracing::warn;
use tracing_subscriber::EnvFilter;


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON in {path}: {source}")]
    InvalidJson { path: PathBuf, source: serde_json::Error },
    #[error("{path}: {source}")]
    Timeline { path: PathBuf, source: RotodragError },
    #[error("output encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{0}")]
    Engine(#[from] RotodragError),
}

#[derive(Parser, Debug)]
#[command(name = "rotodrag", about = "Inspect and edit exported rotodrag timelines")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize a timeline: frame count, end time, shapes.
    Info { file: PathBuf },
    /// Print the frame shown at `ms` (nearest recorded timepoint at or before it).
    Lookup { file: PathBuf, ms: Timepoint },
    /// Print the `[start, end]` segment re-based to start at 0.
    Trim { file: PathBuf, start: Timepoint, end: Timepoint },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Info { file } => run_info(&file),
        Command::Lookup { file, ms } => run_lookup(&file, ms),
        Command::Trim { file, start, end } => run_trim(&file, start, end),
    }
}

fn run_info(file: &Path) -> Result<(), CliError> {
    let (timeline, report) = load(file)?;
    print_json(&info_json(&timeline, report))
}

fn run_lookup(file: &Path, ms: Timepoint) -> Result<(), CliError> {
    let (timeline, _) = load(file)?;
    print_json(&lookup_json(&timeline, ms)?)
}

fn run_trim(file: &Path, start: Timepoint, end: Timepoint) -> Result<(), CliError> {
    if start > end {
        warn!(start, end, "trim range is inverted; only the seed frame is kept");
    }
    let (timeline, _) = load(file)?;
    print_json(&timeline.trim(start, end).to_json()?)
}

/// Frame count, end time, timepoints, shape names and rejected keys.
fn info_json(timeline: &Timeline, report: LoadReport) -> Value {
    let shapes: BTreeSet<&str> = timeline.iter().flat_map(|(_, s)| s.keys().map(String::as_str)).collect();

    let mut out = Map::new();
    out.insert("frames".into(), Value::from(timeline.len()));
    out.insert("record_end".into(), Value::from(timeline.record_end_time()));
    out.insert("timepoints".into(), Value::from(timeline.sorted_timepoints()));
    out.insert("shapes".into(), Value::from(shapes.into_iter().collect::<Vec<_>>()));
    out.insert("rejected".into(), Value::from(report.rejected));
    Value::Object(out)
}

/// The frame shown at `ms`, with the timepoint it was recorded at.
fn lookup_json(timeline: &Timeline, ms: Timepoint) -> Result<Value, CliError> {
    let (timepoint, snapshot) = timeline.snapshot_at(ms).ok_or(RotodragError::EmptyTimeline)?;
    let mut out = Map::new();
    out.insert("timepoint".into(), Value::from(timepoint));
    out.insert("snapshot".into(), serde_json::to_value(snapshot)?);
    Ok(Value::Object(out))
}

fn load(path: &Path) -> Result<(Timeline, LoadReport), CliError> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_path_buf(), source })?;
    parse_timeline(path, &raw)
}

/// Parse an exported timeline. Rejected entries are logged and reported,
/// not fatal.
fn parse_timeline(path: &Path, raw: &str) -> Result<(Timeline, LoadReport), CliError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|source| CliError::InvalidJson { path: path.to_path_buf(), source })?;

    let mut timeline = Timeline::new();
    let report =
        timeline.load_json(&value).map_err(|source| CliError::Timeline { path: path.to_path_buf(), source })?;
    for key in &report.rejected {
        warn!(path = %path.display(), key = %key, "skipped malformed timeline entry");
    }
    Ok((timeline, report))
}

fn print_json(value: &Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
