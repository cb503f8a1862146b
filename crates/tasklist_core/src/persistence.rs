//! Persistence adapter between the task collection and the durable slot.
//!
//! # Responsibility
//! - Serialize the full collection as a JSON array under one fixed key.
//! - Recover from missing or malformed payloads with an empty collection.
//!
//! # Invariants
//! - `load` never returns an error; bad data is logged and dropped.
//! - `save` always writes the whole collection (no partial writes, no merge).
//! - Loaded collections satisfy the task invariants: normalized non-empty
//!   text and unique ids.

use crate::model::task::{normalize_text, Task, TaskId};
use crate::slot::{DurableSlot, SlotError, SlotResult};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;

/// Fixed slot key holding the serialized collection.
pub const STORAGE_KEY: &str = "todo.tasks.v1";

/// Lenient shape for one stored record; unknown keys are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    id: Option<String>,
    text: Option<String>,
    #[serde(default)]
    completed: bool,
    created_at: Option<f64>,
    updated_at: Option<f64>,
}

/// Reads and writes the task collection through a [`DurableSlot`].
pub struct TaskPersistence<S: DurableSlot> {
    slot: S,
}

impl<S: DurableSlot> TaskPersistence<S> {
    pub fn new(slot: S) -> Self {
        Self { slot }
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    /// Loads the stored collection, falling back to empty on any failure.
    pub fn load(&self) -> Vec<Task> {
        let raw = match self.slot.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("event=tasks_load module=persistence status=ok source=missing count=0");
                return Vec::new();
            }
            Err(err) => {
                warn!(
                    "event=tasks_load module=persistence status=recovered error_code=slot_read_failed error={}",
                    err
                );
                return Vec::new();
            }
        };

        let tasks = decode_tasks(&raw);
        debug!(
            "event=tasks_load module=persistence status=ok source=slot count={}",
            tasks.len()
        );
        tasks
    }

    /// Overwrites the stored collection with `tasks`.
    pub fn save(&self, tasks: &[Task]) -> SlotResult<()> {
        let payload = serde_json::to_string(tasks)
            .map_err(|err| SlotError::Unavailable(format!("serialize failed: {err}")))?;
        self.slot.set(STORAGE_KEY, &payload)
    }
}

/// Returns whether a storage notification concerns the task collection.
pub fn is_tasks_key(key: &str) -> bool {
    key == STORAGE_KEY
}

/// Decodes a stored payload, dropping anything that cannot form a valid task.
pub fn decode_tasks(raw: &str) -> Vec<Task> {
    let records = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(records)) => records,
        Ok(other) => {
            warn!(
                "event=tasks_load module=persistence status=recovered error_code=not_an_array kind={}",
                json_kind(&other)
            );
            return Vec::new();
        }
        Err(err) => {
            warn!(
                "event=tasks_load module=persistence status=recovered error_code=invalid_json error={}",
                err
            );
            return Vec::new();
        }
    };

    let total = records.len();
    let mut seen = HashSet::new();
    let tasks: Vec<Task> = records
        .into_iter()
        .filter_map(decode_record)
        .filter(|task| seen.insert(task.id.clone()))
        .collect();

    if tasks.len() != total {
        warn!(
            "event=tasks_load module=persistence status=partial dropped={} kept={}",
            total - tasks.len(),
            tasks.len()
        );
    }
    tasks
}

fn decode_record(record: Value) -> Option<Task> {
    let stored = StoredTask::deserialize(record).ok()?;
    let id = stored.id.filter(|id| !id.is_empty())?;
    let text = normalize_text(stored.text.as_deref()?)?;
    let created_at = stored.created_at.map_or(0, millis);
    let updated_at = stored.updated_at.map_or(created_at, millis);

    let task = Task {
        id: TaskId::new(id),
        text,
        completed: stored.completed,
        created_at,
        updated_at,
    };
    task.validate().ok()?;
    Some(task)
}

// Stored timestamps are JSON numbers and may carry a fraction.
fn millis(value: f64) -> i64 {
    value as i64
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

#[cfg(test)]
mod tests {
    use super::decode_tasks;

    #[test]
    fn decode_fills_missing_fields() {
        let tasks = decode_tasks(r#"[{"id":"a","text":"x","createdAt":10}]"#);
        assert_eq!(tasks.len(), 1);
        assert!(!tasks[0].completed);
        assert_eq!(tasks[0].created_at, 10);
        assert_eq!(tasks[0].updated_at, 10);
    }

    #[test]
    fn decode_skips_unusable_records_and_duplicates() {
        let tasks = decode_tasks(
            r#"[
                {"id":"a","text":"keep"},
                {"text":"no id"},
                {"id":"b","text":"   "},
                {"id":"a","text":"duplicate"},
                42,
                {"id":"c","text":"also keep","completed":true,"extra":[1,2]}
            ]"#,
        );
        let texts: Vec<_> = tasks.iter().map(|task| task.text.as_str()).collect();
        assert_eq!(texts, vec!["keep", "also keep"]);
    }

    #[test]
    fn decode_rejects_wrongly_typed_fields() {
        let tasks = decode_tasks(r#"[{"id":"a","text":"x","completed":"yes"}]"#);
        assert!(tasks.is_empty());
    }
}
