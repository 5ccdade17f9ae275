//! Per-task due-date classification.
//!
//! Both classifiers are pure functions of the record and a reference instant.
//! They fail open: an absent task, a missing due date or an unreadable one all
//! classify as "not overdue" and "not due soon".

use chrono::{DateTime, Days, TimeZone, Utc};

use crate::date::{end_of_day, end_of_day_on, normalize_in};
use crate::fields::{is_terminal_status, PROGRESS_COMPLETED};
use crate::task::TaskRecord;

/// Forward window, in calendar days, used when a caller does not pick one.
pub const DEFAULT_DAYS_AHEAD: u32 = 3;

/// The task's effective due instant, resolved against `tz`.
pub fn due_instant<Tz: TimeZone>(task: &TaskRecord, tz: &Tz) -> Option<DateTime<Utc>> {
    task.raw_due().and_then(|raw| normalize_in(raw, tz))
}

/// True once the whole calendar day a task is due on has passed.
///
/// Finished, cancelled and progress-completed tasks are never overdue.
pub fn is_overdue<Tz: TimeZone>(task: Option<&TaskRecord>, now: &DateTime<Tz>) -> bool {
    let Some(task) = task else {
        return false;
    };
    if is_terminal_status(task.status.as_deref())
        || task.progress_status.as_deref() == Some(PROGRESS_COMPLETED)
    {
        return false;
    }

    let tz = now.timezone();
    let Some(instant) = due_instant(task, &tz) else {
        return false;
    };
    end_of_day(&instant.with_timezone(&tz)) < *now
}

/// True when the due instant lies between `now` and the end of the day
/// `days_ahead` calendar days from now, both ends inclusive.
///
/// Only `status` gates this check; `progress_status` does not.
pub fn is_due_soon<Tz: TimeZone>(task: Option<&TaskRecord>, now: &DateTime<Tz>, days_ahead: u32) -> bool {
    let Some(task) = task else {
        return false;
    };
    if is_terminal_status(task.status.as_deref()) {
        return false;
    }

    let tz = now.timezone();
    let Some(instant) = due_instant(task, &tz) else {
        return false;
    };
    let Some(last_day) = now.date_naive().checked_add_days(Days::new(u64::from(days_ahead))) else {
        return false;
    };
    let upper = end_of_day_on(last_day, &tz);
    *now <= instant && instant <= upper
}

impl TaskRecord {
    pub fn is_overdue<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        is_overdue(Some(self), now)
    }

    pub fn is_due_soon<Tz: TimeZone>(&self, now: &DateTime<Tz>, days_ahead: u32) -> bool {
        is_due_soon(Some(self), now, days_ahead)
    }
}
