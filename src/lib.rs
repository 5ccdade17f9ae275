//! # Due Radar - task due-date classification
//!
//! The business rules behind a team dashboard's "overdue" and "due soon" views,
//! as a small set of pure functions plus a reporting CLI over exported snapshots.
//!
//! ## Pipeline
//!
//! - **[`date`]**: turns the due-date shapes a document store produces (ISO text,
//!   `{seconds}` records, self-converting timestamp records, anything else) into
//!   one UTC instant, or nothing.
//! - **[`classify`]**: `is_overdue` (grace until the end of the due day) and
//!   `is_due_soon` (from now through the end of the day N days ahead).
//! - **[`aggregate`]**: overdue/due-soon lists, counts, percentage and priority
//!   buckets, plus [`aggregate::DueReport`] which computes all of them from one
//!   clock reading.
//!
//! Classification fails open: absent tasks, missing dates and unreadable dates
//! are simply "not overdue" and "not due soon". Nothing in the pipeline panics
//! or returns an error.
//!
//! ## Quick Start
//!
//! ```
//! use chrono::{FixedOffset, TimeZone};
//! use due_radar::aggregate::{overdue_count, overdue_percentage};
//! use due_radar::task::tasks_from_value;
//!
//! let tasks = tasks_from_value(&serde_json::json!([
//!     {"id": "a", "status": "pending", "due_date": "2024-01-01"},
//!     {"id": "b", "dueDate": {"seconds": 1900000000}},
//! ]));
//! let now = FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap();
//! assert_eq!(overdue_count(&tasks, &now), 1);
//! assert_eq!(overdue_percentage(&tasks, &now), 50);
//! ```
//!
//! ## CLI
//!
//! - `radar summary` - counts, percentage and priority breakdown
//! - `radar overdue --priority high` - overdue task table
//! - `radar due-soon --days-ahead 7` - upcoming work
//! - `radar check <id>` - how one task's due date resolves
//! - `radar projects` - per-project overview of a snapshot directory
//!
//! Snapshots are read from `~/.due_radar/` by default, one `<project>_tasks.json`
//! per project.

pub mod aggregate;
pub mod classify;
pub mod cli;
pub mod clock;
pub mod cmd;
pub mod date;
pub mod error;
pub mod fields;
pub mod project;
pub mod snapshot;
pub mod task;
