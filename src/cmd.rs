//! Command implementations for the CLI interface.
//!
//! Each command reads the clock exactly once. Handlers that build a
//! [`DueReport`] take the [`Clock`] and let the report capture the instant; the
//! rest receive the instant `main` read for them. Either way every view a
//! command prints is classified against the same moment.

use std::fs;
use std::path::Path;

use chrono::{DateTime, TimeZone};
use clap::Subcommand;
use clap_complete::{generate, Shell};
use serde_json::json;
use tracing::{debug, info};

use crate::aggregate::{due_soon_tasks, overdue_by_priority, overdue_tasks, DueReport};
use crate::classify::{due_instant, DEFAULT_DAYS_AHEAD};
use crate::clock::Clock;
use crate::date::resolve;
use crate::error::SnapshotError;
use crate::fields::*;
use crate::project::{discover_projects, get_legacy_project};
use crate::snapshot::*;
use crate::task::TaskRecord;

#[derive(Subcommand)]
pub enum Commands {
    /// Overdue count and percentage, due-soon count and priority breakdown.
    Summary {
        /// Days ahead counted as "due soon".
        #[arg(long, default_value_t = DEFAULT_DAYS_AHEAD)]
        days_ahead: u32,
    },

    /// List overdue tasks.
    Overdue {
        /// Only tasks with this priority: high | medium | low.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List tasks due between now and the end of the day N days ahead.
    DueSoon {
        /// Days ahead counted as "due soon".
        #[arg(long, default_value_t = DEFAULT_DAYS_AHEAD)]
        days_ahead: u32,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Overdue tasks grouped by priority.
    Priority,

    /// Show how a single task is classified.
    Check {
        /// Task ID or title.
        id: String,
        /// Days ahead counted as "due soon".
        #[arg(long, default_value_t = DEFAULT_DAYS_AHEAD)]
        days_ahead: u32,
    },

    /// Overdue summary for every project snapshot in the directory.
    Projects {
        /// Days ahead counted as "due soon".
        #[arg(long, default_value_t = DEFAULT_DAYS_AHEAD)]
        days_ahead: u32,
    },

    /// Export overdue tasks to CSV.
    Export {
        /// Output file path (defaults to overdue.csv).
        #[arg(long)]
        output: Option<String>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn print_json(value: &impl serde::Serialize) -> Result<(), SnapshotError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the combined dashboard summary.
pub fn cmd_summary<C: Clock>(
    snapshot: &Snapshot,
    clock: &C,
    days_ahead: u32,
    format: OutputFormat,
) -> Result<(), SnapshotError> {
    let report = DueReport::capture(&snapshot.tasks, clock, days_ahead);
    debug!(now = %report.generated_at.to_rfc3339(), "reference instant captured");
    if format == OutputFormat::Json {
        return print_json(&report);
    }

    let buckets = &report.by_priority;
    println!("As of:       {}", report.generated_at.to_rfc3339());
    println!("Tasks:       {}", report.total);
    println!("Overdue:     {} ({}%)", report.overdue_count, report.overdue_percentage);
    println!("Due soon:    {} (next {} days)", report.due_soon.len(), days_ahead);
    println!("  High:      {}", buckets.high.len());
    println!("  Medium:    {}", buckets.medium.len());
    println!("  Low:       {}", buckets.low.len());
    println!("  Other:     {}", buckets.total - buckets.bucketed());
    Ok(())
}

/// List overdue tasks, optionally restricted to one priority.
pub fn cmd_overdue<Tz: TimeZone>(
    snapshot: &Snapshot,
    now: &DateTime<Tz>,
    priority: Option<Priority>,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<(), SnapshotError> {
    let mut rows = overdue_tasks(&snapshot.tasks, now);
    if let Some(p) = priority {
        rows.retain(|t| t.priority_bucket() == Some(p));
    }
    if let Some(n) = limit {
        rows.truncate(n);
    }
    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            print_table(&rows, now);
            Ok(())
        }
    }
}

/// List tasks due within the forward window.
pub fn cmd_due_soon<Tz: TimeZone>(
    snapshot: &Snapshot,
    now: &DateTime<Tz>,
    days_ahead: u32,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<(), SnapshotError> {
    let mut rows = due_soon_tasks(&snapshot.tasks, now, days_ahead);
    if let Some(n) = limit {
        rows.truncate(n);
    }
    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            print_table(&rows, now);
            Ok(())
        }
    }
}

/// Print overdue tasks bucketed by priority.
pub fn cmd_priority<Tz: TimeZone>(
    snapshot: &Snapshot,
    now: &DateTime<Tz>,
    format: OutputFormat,
) -> Result<(), SnapshotError> {
    let buckets = overdue_by_priority(&snapshot.tasks, now);
    if format == OutputFormat::Json {
        return print_json(&buckets);
    }

    for priority in [Priority::High, Priority::Medium, Priority::Low] {
        let rows = buckets.bucket(priority);
        println!("== {} ({})", priority.as_str(), rows.len());
        if !rows.is_empty() {
            print_table(rows, now);
        }
        println!();
    }
    println!("Overdue total: {} ({} without a recognised priority)", buckets.total, buckets.total - buckets.bucketed());
    Ok(())
}

/// Explain how one task resolves and classifies.
pub fn cmd_check<Tz: TimeZone>(
    snapshot: &Snapshot,
    now: &DateTime<Tz>,
    identifier: &str,
    days_ahead: u32,
    format: OutputFormat,
) -> Result<(), SnapshotError> {
    let task = snapshot.find(identifier)?;
    let tz = now.timezone();
    let resolved = task.raw_due().map(|raw| resolve(raw, &tz));
    let overdue = task.is_overdue(now);
    let due_soon = task.is_due_soon(now, days_ahead);

    let resolved_text = match &resolved {
        None => "-".to_string(),
        Some(Ok(instant)) => instant.with_timezone(&tz).fixed_offset().to_rfc3339(),
        Some(Err(e)) => format!("unrepresentable ({e})"),
    };

    if format == OutputFormat::Json {
        let resolved_due = match &resolved {
            Some(Ok(instant)) => Some(instant.to_rfc3339()),
            _ => None,
        };
        return print_json(&json!({
            "id": task.id,
            "title": task.title,
            "status": task.status,
            "progress_status": task.progress_status,
            "priority": task.priority,
            "raw_due": task.raw_due(),
            "resolved_due": resolved_due,
            "overdue": overdue,
            "due_soon": due_soon,
            "days_ahead": days_ahead,
        }));
    }

    let due = due_instant(task, &tz).map(|d| d.with_timezone(&tz));
    println!("ID:           {}", task.id);
    println!("Title:        {}", task.title.as_deref().unwrap_or("-"));
    println!("Status:       {}", task.status.as_deref().unwrap_or("-"));
    println!("Progress:     {}", task.progress_status.as_deref().unwrap_or("-"));
    println!("Priority:     {}", task.priority.as_deref().unwrap_or("-"));
    println!("Raw due:      {}", task.raw_due().map(|r| r.to_string()).unwrap_or_else(|| "-".into()));
    println!("Resolved due: {}", resolved_text);
    println!("Relative:     {}", format_due_relative(due, now));
    println!("Overdue:      {}", if overdue { "yes" } else { "no" });
    println!("Due soon:     {} (next {} days)", if due_soon { "yes" } else { "no" }, days_ahead);
    Ok(())
}

/// Summarise every project snapshot found in `dir`.
pub fn cmd_projects<C: Clock>(
    dir: &Path,
    clock: &C,
    days_ahead: u32,
    format: OutputFormat,
) -> Result<(), SnapshotError> {
    let mut projects = discover_projects(dir)?;
    projects.extend(get_legacy_project(dir));

    // Every project is reported against the same instant.
    let now = clock.now();

    let snapshots: Vec<_> = projects.iter().map(|p| (p, p.load_snapshot())).collect();
    let reports: Vec<_> = snapshots
        .iter()
        .map(|(p, s)| (*p, DueReport::at(&s.tasks, &now, days_ahead)))
        .collect();

    if format == OutputFormat::Json {
        let rows: Vec<_> = reports
            .iter()
            .map(|(p, r)| {
                json!({
                    "project": p.display_name,
                    "file": p.file_path,
                    "total": r.total,
                    "overdue": r.overdue_count,
                    "overdue_percentage": r.overdue_percentage,
                    "due_soon": r.due_soon.len(),
                })
            })
            .collect();
        return print_json(&rows);
    }

    if reports.is_empty() {
        println!("No project snapshots found in {}", dir.display());
        return Ok(());
    }
    println!("{:<20} {:>6} {:>8} {:>5} {:>9}", "Project", "Tasks", "Overdue", "%", "Due soon");
    for (p, r) in &reports {
        println!(
            "{:<20} {:>6} {:>8} {:>5} {:>9}",
            truncate(&p.display_name, 20),
            r.total,
            r.overdue_count,
            r.overdue_percentage,
            r.due_soon.len()
        );
    }
    Ok(())
}

/// Build the CSV body for a set of overdue tasks.
pub fn overdue_csv<Tz: TimeZone>(tasks: &[&TaskRecord], now: &DateTime<Tz>) -> String {
    let tz = now.timezone();
    let mut csv = String::from("ID,Title,Status,Priority,Due,DaysLate\n");
    for task in tasks {
        let due = due_instant(task, &tz).map(|d| d.with_timezone(&tz));
        let due_text = due.as_ref().map(|d| d.date_naive().to_string()).unwrap_or_else(|| "-".into());
        let days_late = due
            .as_ref()
            .map(|d| (now.date_naive() - d.date_naive()).num_days().to_string())
            .unwrap_or_else(|| "-".into());
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            escape_csv(&task.id.0),
            escape_csv(task.title.as_deref().unwrap_or("-")),
            escape_csv(task.status.as_deref().unwrap_or("-")),
            escape_csv(task.priority.as_deref().unwrap_or("-")),
            due_text,
            days_late
        ));
    }
    csv
}

fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Write overdue tasks to a CSV file.
pub fn cmd_export<Tz: TimeZone>(
    snapshot: &Snapshot,
    now: &DateTime<Tz>,
    output: Option<String>,
) -> Result<(), SnapshotError> {
    let output_path = output.unwrap_or_else(|| "overdue.csv".to_string());
    let rows = overdue_tasks(&snapshot.tasks, now);
    fs::write(&output_path, overdue_csv(&rows, now)).map_err(|e| SnapshotError::io(&output_path, e))?;
    info!(path = %output_path, count = rows.len(), "exported overdue tasks");
    println!("Exported {} overdue task(s) to {}", rows.len(), output_path);
    Ok(())
}

pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}
