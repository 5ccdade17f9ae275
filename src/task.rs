//! Task records as the external data layer produces them.
//!
//! Records are read-only here. Decoding is lenient: a field holding the wrong
//! JSON type is read as absent rather than rejecting the whole record, so one
//! odd document never hides the rest of a dashboard.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::date::RawDue;
use crate::fields::Priority;

/// Opaque, stable identifier for a task record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = match Value::deserialize(deserializer)? {
            Value::Null => String::new(),
            Value::String(s) => s,
            other => other.to_string(),
        };
        Ok(TaskId(id))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(s.to_string())
    }
}

/// A single work item as stored by the dashboard's document store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(default)]
    pub id: TaskId,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub progress_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<RawDue>,
    #[serde(rename = "dueDate", default, skip_serializing_if = "Option::is_none")]
    pub due_date_alt: Option<RawDue>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// Every other field, preserved untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskRecord {
    pub fn new(id: impl Into<String>) -> Self {
        TaskRecord { id: TaskId(id.into()), ..Default::default() }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_progress_status(mut self, progress: impl Into<String>) -> Self {
        self.progress_status = Some(progress.into());
        self
    }

    pub fn with_due(mut self, due: RawDue) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    /// The effective due value: `due_date` when present, else `dueDate`.
    pub fn raw_due(&self) -> Option<&RawDue> {
        self.due_date.as_ref().or(self.due_date_alt.as_ref())
    }

    /// Recognised priority bucket, if the record's priority matches one exactly.
    pub fn priority_bucket(&self) -> Option<Priority> {
        self.priority.as_deref().and_then(Priority::from_exact)
    }

    /// Title for display, falling back to the id.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id.0)
    }
}

/// Read a string field, treating any non-string JSON value as absent.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// A collection slot that may or may not hold a task.
///
/// Aggregations accept slices of either `TaskRecord` or `Option<TaskRecord>`.
/// Empty slots classify as neither overdue nor due soon but still count toward
/// a collection's size.
pub trait TaskEntry {
    fn task(&self) -> Option<&TaskRecord>;
}

impl TaskEntry for TaskRecord {
    fn task(&self) -> Option<&TaskRecord> {
        Some(self)
    }
}

impl TaskEntry for Option<TaskRecord> {
    fn task(&self) -> Option<&TaskRecord> {
        self.as_ref()
    }
}

/// Decode a task collection from untyped JSON.
///
/// Anything other than an array yields an empty collection. Array entries that
/// are not objects, or that fail to decode, keep their slot as `None`.
pub fn tasks_from_value(value: &Value) -> Vec<Option<TaskRecord>> {
    let Some(items) = value.as_array() else {
        debug!(kind = json_kind(value), "task collection is not an array, using empty set");
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if !item.is_object() {
                debug!(index = i, kind = json_kind(item), "non-object task entry, treating as absent");
                return None;
            }
            match TaskRecord::deserialize(item) {
                Ok(task) => Some(task),
                Err(e) => {
                    debug!(index = i, error = %e, "undecodable task entry, treating as absent");
                    None
                }
            }
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
