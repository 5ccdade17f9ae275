//! Task snapshots and table formatting.
//!
//! The data layer exports task collections as JSON files: either a bare array of
//! records or an object with a `tasks` array. This module loads them into a
//! [`Snapshot`] and provides the helpers used to print task tables.

use std::fs;
use std::path::Path;

use chrono::{DateTime, TimeZone};
use serde_json::Value;
use tracing::{debug, warn};

use crate::classify::due_instant;
use crate::error::SnapshotError;
use crate::task::{tasks_from_value, TaskRecord};

/// In-memory copy of one exported task collection.
///
/// Entries that were not task objects stay as `None` so that percentages are
/// taken over the collection as exported.
#[derive(Debug, Default, Clone)]
pub struct Snapshot {
    pub tasks: Vec<Option<TaskRecord>>,
}

impl Snapshot {
    /// Load a snapshot file. A missing file is an empty snapshot.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        if !path.exists() {
            debug!(path = %path.display(), "snapshot file missing, starting empty");
            return Ok(Snapshot::default());
        }
        let buf = fs::read_to_string(path).map_err(|e| SnapshotError::io(path, e))?;
        let value: Value = serde_json::from_str(&buf)
            .map_err(|source| SnapshotError::Parse { path: path.to_path_buf(), source })?;
        Ok(Snapshot::from_value(&value))
    }

    /// Load a snapshot, logging any failure and falling back to empty.
    pub fn load_or_empty(path: &Path) -> Self {
        match Snapshot::load(path) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("{e}; continuing with an empty snapshot");
                Snapshot::default()
            }
        }
    }

    /// Accepts `[...]` or `{"tasks": [...]}`; any other payload is empty.
    pub fn from_value(value: &Value) -> Self {
        let collection = match value {
            Value::Object(map) => map.get("tasks"),
            other => Some(other),
        };
        match collection {
            Some(tasks) if tasks.is_array() => Snapshot { tasks: tasks_from_value(tasks) },
            _ => {
                warn!("snapshot payload holds no task array, treating as empty");
                Snapshot::default()
            }
        }
    }

    /// The task records present in the snapshot, in order.
    pub fn records(&self) -> impl Iterator<Item = &TaskRecord> + '_ {
        self.tasks.iter().flatten()
    }

    pub fn get(&self, id: &str) -> Option<&TaskRecord> {
        self.records().find(|t| t.id.0 == id)
    }

    /// Resolve a task by exact id, then by case-insensitive title.
    pub fn find(&self, identifier: &str) -> Result<&TaskRecord, SnapshotError> {
        if let Some(task) = self.get(identifier) {
            return Ok(task);
        }

        let needle = identifier.to_lowercase();
        let matches: Vec<&TaskRecord> = self
            .records()
            .filter(|t| t.title.as_deref().map(str::to_lowercase).as_deref() == Some(needle.as_str()))
            .collect();

        match matches.as_slice() {
            [] => Err(SnapshotError::TaskNotFound(identifier.to_string())),
            [task] => Ok(*task),
            many => Err(SnapshotError::AmbiguousTask {
                query: identifier.to_string(),
                ids: many.iter().map(|t| t.id.0.as_str()).collect::<Vec<_>>().join(", "),
            }),
        }
    }
}

/// Format a due instant relative to `now`'s calendar day ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative<Tz: TimeZone>(due: Option<DateTime<Tz>>, now: &DateTime<Tz>) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let days = (d.date_naive() - now.date_naive()).num_days();
            if days == 0 {
                "today".into()
            } else if days == 1 {
                "tomorrow".into()
            } else if days > 1 {
                format!("in {days}d")
            } else {
                format!("{}d late", -days)
            }
        }
    }
}

/// Print tasks as a table with their due dates relative to `now`.
pub fn print_table<Tz: TimeZone>(tasks: &[&TaskRecord], now: &DateTime<Tz>) {
    println!(
        "{:<12} {:<11} {:<8} {:<10} {}",
        "ID", "Status", "Pri", "Due", "Title"
    );
    let tz = now.timezone();
    for t in tasks {
        let due = due_instant(t, &tz).map(|d| d.with_timezone(&tz));
        println!(
            "{:<12} {:<11} {:<8} {:<10} {}",
            truncate(&t.id.0, 12),
            truncate(t.status.as_deref().unwrap_or("-"), 11),
            truncate(t.priority.as_deref().unwrap_or("-"), 8),
            format_due_relative(due, now),
            t.label()
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_load_both_payload_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let bare = dir.path().join("bare.json");
        let wrapped = dir.path().join("wrapped.json");
        fs::write(&bare, r#"[{"id": "a"}, {"id": "b"}]"#).unwrap();
        fs::write(&wrapped, r#"{"tasks": [{"id": "c"}], "exported_at": "2024-06-10"}"#).unwrap();

        assert_eq!(Snapshot::load(&bare).unwrap().tasks.len(), 2);
        assert_eq!(Snapshot::load(&wrapped).unwrap().records().next().unwrap().id.0, "c");
    }

    #[test]
    fn test_missing_and_unusable_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Snapshot::load(&dir.path().join("absent.json")).unwrap().tasks.is_empty());

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(Snapshot::load(&bad), Err(SnapshotError::Parse { .. })));
        assert!(Snapshot::load_or_empty(&bad).tasks.is_empty());

        let scalar = dir.path().join("scalar.json");
        fs::write(&scalar, "42").unwrap();
        assert!(Snapshot::load(&scalar).unwrap().tasks.is_empty());
    }

    #[test]
    fn test_find_by_id_or_title() {
        let snapshot = Snapshot::from_value(&json!([
            {"id": "1", "title": "Write report"},
            {"id": "2", "title": "Review"},
            {"id": "3", "title": "review"}
        ]));
        assert_eq!(snapshot.find("1").unwrap().id.0, "1");
        assert_eq!(snapshot.find("WRITE REPORT").unwrap().id.0, "1");
        assert!(matches!(snapshot.find("review"), Err(SnapshotError::AmbiguousTask { .. })));
        assert!(matches!(snapshot.find("nothing"), Err(SnapshotError::TaskNotFound(_))));
    }

    #[test]
    fn test_absent_entries_are_kept_but_not_findable() {
        let snapshot = Snapshot::from_value(&json!({"tasks": [null, {"id": "1", "title": "Plan"}, 7]}));
        assert_eq!(snapshot.tasks.len(), 3);
        assert_eq!(snapshot.records().count(), 1);
        assert_eq!(snapshot.find("plan").unwrap().id.0, "1");
    }

    #[test]
    fn test_format_due_relative() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 15, 0, 0).unwrap();
        let on = |d: u32| Some(Utc.with_ymd_and_hms(2024, 6, d, 9, 0, 0).unwrap());
        assert_eq!(format_due_relative(on(10), &now), "today");
        assert_eq!(format_due_relative(on(11), &now), "tomorrow");
        assert_eq!(format_due_relative(on(14), &now), "in 4d");
        assert_eq!(format_due_relative(on(8), &now), "2d late");
        assert_eq!(format_due_relative(None, &now), "-");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer title", 8), "a much …");
    }
}
