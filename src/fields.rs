//! Recognised field values and CLI enumerations.
//!
//! Task records arrive with open-ended string fields. This module pins down the
//! handful of values the classifiers treat specially: the terminal statuses, the
//! completed progress marker, and the three priority buckets.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Status value for a finished task.
pub const STATUS_COMPLETED: &str = "completed";
/// Status value for an abandoned task.
pub const STATUS_CANCELLED: &str = "cancelled";
/// `progress_status` value that suppresses overdue alerts.
pub const PROGRESS_COMPLETED: &str = "completed";

/// Returns true for statuses that end a task's lifecycle.
///
/// Matching is exact; anything else, including a missing status, is active.
pub fn is_terminal_status(status: Option<&str>) -> bool {
    matches!(status, Some(STATUS_COMPLETED) | Some(STATUS_CANCELLED))
}

/// Priority buckets used by the overdue breakdown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Exact, case-sensitive match against a record's priority text.
    pub fn from_exact(s: &str) -> Option<Priority> {
        match s {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// Output rendering for CLI reports.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}
