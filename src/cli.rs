use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use clap::{ArgAction, Parser};

use crate::cmd::Commands;
use crate::fields::OutputFormat;

/// Overdue and due-soon reports over exported task snapshots.
/// Reads ./tasks.json style exports from --file, or the newest snapshot in --dir.
#[derive(Parser)]
#[command(name = "radar", version, about = "Task due-date radar for dashboard snapshots")]
pub struct Cli {
    /// Snapshot file to read.
    #[arg(long, global = true, env = "DUE_RADAR_FILE")]
    pub file: Option<PathBuf>,

    /// Directory holding `<project>_tasks.json` snapshots. Defaults to ~/.due_radar.
    #[arg(long, global = true, env = "DUE_RADAR_DIR")]
    pub dir: Option<PathBuf>,

    /// Project whose snapshot to read from --dir.
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// Reference instant as RFC 3339, e.g. 2024-06-10T09:00:00+02:00. Defaults to now.
    #[arg(long, global = true, value_parser = parse_now)]
    pub now: Option<DateTime<FixedOffset>>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

fn parse_now(s: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(s).map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}
