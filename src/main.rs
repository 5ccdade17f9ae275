use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

use due_radar::cli::Cli;
use due_radar::clock::{Clock, FixedClock, SystemClock};
use due_radar::cmd::*;
use due_radar::error::SnapshotError;
use due_radar::project::*;
use due_radar::snapshot::Snapshot;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let frozen = cli.now;
    let result = match frozen {
        Some(now) => run(cli, &FixedClock(now)),
        None => run(cli, &SystemClock),
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(e.exit_code());
    }
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .init();
}

fn default_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".due_radar")
}

/// Pick the snapshot: --file, then --project in --dir, then the newest snapshot in --dir.
fn snapshot_path(file: Option<&Path>, project: Option<&str>, dir: &Path) -> Result<PathBuf, SnapshotError> {
    if let Some(file) = file {
        return Ok(file.to_path_buf());
    }
    if let Some(name) = project {
        return Ok(Project::new(name, dir).file_path);
    }
    Ok(get_most_recent_project(dir)?
        .map(|p| p.file_path)
        .unwrap_or_else(|| dir.join("tasks.json")))
}

fn load_snapshot(file: Option<&Path>, project: Option<&str>, dir: &Path) -> Result<Snapshot, SnapshotError> {
    let path = snapshot_path(file, project, dir)?;
    if !path.exists() {
        warn!("no snapshot at {}, reporting on an empty task set", path.display());
    }
    let snapshot = Snapshot::load(&path)?;
    debug!(path = %path.display(), tasks = snapshot.tasks.len(), "snapshot loaded");
    Ok(snapshot)
}

/// Dispatch one command. Each arm reads `clock` at most once.
fn run<C: Clock>(cli: Cli, clock: &C) -> Result<(), SnapshotError> {
    let Cli { file, dir, project, format, command, .. } = cli;
    let dir = dir.unwrap_or_else(default_dir);
    let load = || load_snapshot(file.as_deref(), project.as_deref(), &dir);

    match command {
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
        Commands::Projects { days_ahead } => cmd_projects(&dir, clock, days_ahead, format),
        Commands::Summary { days_ahead } => cmd_summary(&load()?, clock, days_ahead, format),
        Commands::Overdue { priority, limit } => cmd_overdue(&load()?, &clock.now(), priority, limit, format),
        Commands::DueSoon { days_ahead, limit } => cmd_due_soon(&load()?, &clock.now(), days_ahead, limit, format),
        Commands::Priority => cmd_priority(&load()?, &clock.now(), format),
        Commands::Check { id, days_ahead } => cmd_check(&load()?, &clock.now(), &id, days_ahead, format),
        Commands::Export { output } => cmd_export(&load()?, &clock.now(), output),
    }
}
