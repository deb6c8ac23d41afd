//! Best-effort decoding of stored task and session records.
//!
//! Stored data carries no schema version, so every record is rebuilt field by
//! field on load. New fields only need a rule here.

use std::collections::HashSet;

use serde_json::Value;

use crate::models::{normalize_tags, Priority, Task, TimerSession, Timestamp};

const UNTITLED: &str = "Untitled Task";
const UNNAMED: &str = "Unnamed Task";

/// Rebuilds every record of a stored task array, dropping the ones that are
/// not objects. Non-array input yields an empty collection.
///
/// Records without an id get `now`, `now + 1`, ... skipping ids already taken.
pub fn migrate_tasks(value: &Value, now: Timestamp) -> Vec<Task> {
    let Some(records) = value.as_array() else {
        return Vec::new();
    };
    let taken: HashSet<i64> = records.iter().filter_map(stored_id).collect();
    let mut fallback = now;
    records
        .iter()
        .filter_map(|record| {
            if stored_id(record).is_some() {
                return migrate_task(record, now);
            }
            while taken.contains(&fallback) {
                fallback += 1;
            }
            let task = migrate_task(record, fallback)?;
            fallback += 1;
            Some(task)
        })
        .collect()
}

/// Rebuilds a single record. Returns `None` for anything that is not an object.
pub fn migrate_task(record: &Value, now: Timestamp) -> Option<Task> {
    let obj = record.as_object()?;

    let id = obj.get("id").and_then(positive_number).unwrap_or(now);
    let text = obj
        .get("text")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNTITLED)
        .to_string();
    let completed = obj.get("completed").and_then(Value::as_bool).unwrap_or(false);
    let priority = obj
        .get("priority")
        .and_then(Value::as_str)
        .and_then(|p| match p {
            "A" => Some(Priority::A),
            "B" => Some(Priority::B),
            "C" => Some(Priority::C),
            _ => None,
        })
        .unwrap_or(Priority::B);
    let order = obj.get("order").and_then(number).unwrap_or(id);
    let tags = match obj.get("tags") {
        Some(Value::Array(items)) => normalize_tags(items.iter().filter_map(Value::as_str)),
        _ => Default::default(),
    };

    Some(Task {
        id,
        text,
        completed,
        priority,
        order,
        completed_at: obj.get("completedAt").and_then(positive_number),
        reminder_at: obj.get("reminderAt").and_then(positive_number),
        reminder_notified: obj.get("reminderNotified").and_then(Value::as_bool).unwrap_or(false),
        tags,
    })
}

/// Rebuilds every record of a stored session array.
///
/// A record needs a numeric `duration` and a positive `completedAt`; records
/// lacking either are dropped on their own without affecting the rest.
pub fn migrate_sessions(value: &Value) -> Vec<TimerSession> {
    value
        .as_array()
        .map(|records| records.iter().filter_map(migrate_session).collect())
        .unwrap_or_default()
}

pub fn migrate_session(record: &Value) -> Option<TimerSession> {
    let obj = record.as_object()?;
    let duration = obj.get("duration").and_then(number).filter(|d| *d >= 0)?;
    let completed_at = obj.get("completedAt").and_then(positive_number)?;
    let task_name = obj
        .get("taskName")
        .and_then(Value::as_str)
        .unwrap_or(UNNAMED)
        .to_string();
    Some(TimerSession { task_name, duration: duration as u64, completed_at })
}

fn stored_id(record: &Value) -> Option<i64> {
    record.get("id").and_then(positive_number)
}

fn number(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}

// Zero counts as missing, the same as an absent timestamp.
fn positive_number(value: &Value) -> Option<i64> {
    number(value).filter(|n| *n > 0)
}
