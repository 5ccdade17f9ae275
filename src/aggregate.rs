//! Collection-level views over task records.
//!
//! Every view borrows from the input slice and keeps its order. Pass the same
//! `now` to every view rendered together, or use [`DueReport`], which reads the
//! clock once and derives all of them from that one instant.

use chrono::{DateTime, FixedOffset, TimeZone};
use serde::Serialize;

use crate::classify::is_overdue;
use crate::clock::Clock;
use crate::fields::Priority;
use crate::task::{TaskEntry, TaskRecord};

/// Overdue tasks split by recognised priority.
///
/// `total` counts every overdue task; records whose priority is missing or not
/// one of the three buckets count toward `total` but sit in no bucket.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PriorityBuckets<'a> {
    pub high: Vec<&'a TaskRecord>,
    pub medium: Vec<&'a TaskRecord>,
    pub low: Vec<&'a TaskRecord>,
    pub total: usize,
}

impl<'a> PriorityBuckets<'a> {
    pub fn partition(overdue: &[&'a TaskRecord]) -> Self {
        let mut buckets = PriorityBuckets { total: overdue.len(), ..Default::default() };
        for &task in overdue {
            match task.priority_bucket() {
                Some(Priority::High) => buckets.high.push(task),
                Some(Priority::Medium) => buckets.medium.push(task),
                Some(Priority::Low) => buckets.low.push(task),
                None => {}
            }
        }
        buckets
    }

    pub fn bucket(&self, priority: Priority) -> &[&'a TaskRecord] {
        match priority {
            Priority::High => &self.high,
            Priority::Medium => &self.medium,
            Priority::Low => &self.low,
        }
    }

    /// Number of tasks that landed in one of the three buckets.
    pub fn bucketed(&self) -> usize {
        self.high.len() + self.medium.len() + self.low.len()
    }
}

pub fn overdue_tasks<'a, T: TaskEntry, Tz: TimeZone>(tasks: &'a [T], now: &DateTime<Tz>) -> Vec<&'a TaskRecord> {
    tasks.iter().filter_map(|e| e.task()).filter(|t| t.is_overdue(now)).collect()
}

pub fn overdue_count<T: TaskEntry, Tz: TimeZone>(tasks: &[T], now: &DateTime<Tz>) -> usize {
    tasks.iter().filter(|e| is_overdue(e.task(), now)).count()
}

pub fn due_soon_tasks<'a, T: TaskEntry, Tz: TimeZone>(
    tasks: &'a [T],
    now: &DateTime<Tz>,
    days_ahead: u32,
) -> Vec<&'a TaskRecord> {
    tasks.iter().filter_map(|e| e.task()).filter(|t| t.is_due_soon(now, days_ahead)).collect()
}

/// Share of overdue tasks as a whole percentage; `0` for an empty collection.
///
/// The denominator is the collection's length, absent entries included.
pub fn overdue_percentage<T: TaskEntry, Tz: TimeZone>(tasks: &[T], now: &DateTime<Tz>) -> u32 {
    percentage(overdue_count(tasks, now), tasks.len())
}

pub fn overdue_by_priority<'a, T: TaskEntry, Tz: TimeZone>(tasks: &'a [T], now: &DateTime<Tz>) -> PriorityBuckets<'a> {
    PriorityBuckets::partition(&overdue_tasks(tasks, now))
}

/// `round(part / total * 100)` with halves rounded up, in integer arithmetic.
pub fn percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let (part, total) = (part as u128, total as u128);
    let rounded = (part * 200 + total) / (total * 2);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// Every dashboard view, computed against a single reference instant.
#[derive(Debug, Clone, Serialize)]
pub struct DueReport<'a> {
    pub generated_at: DateTime<FixedOffset>,
    pub days_ahead: u32,
    pub total: usize,
    pub overdue_count: usize,
    pub overdue_percentage: u32,
    pub overdue: Vec<&'a TaskRecord>,
    pub due_soon: Vec<&'a TaskRecord>,
    pub by_priority: PriorityBuckets<'a>,
}

impl<'a> DueReport<'a> {
    /// Read `clock` once and build the report from that reading.
    pub fn capture<T: TaskEntry, C: Clock>(tasks: &'a [T], clock: &C, days_ahead: u32) -> Self {
        let now = clock.now();
        Self::at(tasks, &now, days_ahead)
    }

    pub fn at<T: TaskEntry, Tz: TimeZone>(tasks: &'a [T], now: &DateTime<Tz>, days_ahead: u32) -> Self {
        let overdue = overdue_tasks(tasks, now);
        let by_priority = PriorityBuckets::partition(&overdue);
        DueReport {
            generated_at: now.fixed_offset(),
            days_ahead,
            total: tasks.len(),
            overdue_count: overdue.len(),
            overdue_percentage: percentage(overdue.len(), tasks.len()),
            due_soon: due_soon_tasks(tasks, now, days_ahead),
            by_priority,
            overdue,
        }
    }
}
