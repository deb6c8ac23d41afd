use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Current wall-clock time as a [`Timestamp`].
pub fn now_millis() -> Timestamp {
    Utc::now().timestamp_millis()
}

/// Task priority. Letters sort the way they read: `A` before `B` before `C`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    /// High.
    A,
    /// Medium.
    #[default]
    B,
    /// Low.
    C,
}

impl Priority {
    /// Human label shown in tables.
    pub fn label(self) -> &'static str {
        match self {
            Priority::A => "High",
            Priority::B => "Medium",
            Priority::C => "Low",
        }
    }

    pub fn letter(self) -> &'static str {
        match self {
            Priority::A => "A",
            Priority::B => "B",
            Priority::C => "C",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "high" => Ok(Priority::A),
            "b" | "medium" => Ok(Priority::B),
            "c" | "low" => Ok(Priority::C),
            other => Err(Error::InvalidInput(format!(
                "unknown priority '{other}'. Use A, B or C."
            ))),
        }
    }
}

/// Represents a single task in the task list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Creation timestamp, unique within the collection.
    pub id: i64,
    /// Display text, trimmed and never empty.
    pub text: String,
    /// Whether the task has been completed.
    pub completed: bool,
    pub priority: Priority,
    /// Manual-sort position.
    pub order: i64,
    /// When the task was last completed. Cleared when it is reopened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    /// When the user wants to be reminded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_at: Option<Timestamp>,
    /// Set once the reminder has fired.
    #[serde(default)]
    pub reminder_notified: bool,
    /// Tags in first-added order.
    #[serde(default)]
    pub tags: IndexSet<String>,
}

impl Task {
    /// True when the reminder is due at `now` and has not fired yet.
    pub fn reminder_due(&self, now: Timestamp) -> bool {
        !self.completed
            && !self.reminder_notified
            && self.reminder_at.is_some_and(|at| at <= now)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub text: String,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub reminder_at: Option<Timestamp>,
}

/// Partial update of a task. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub priority: Option<Priority>,
    pub tags: Option<Vec<String>>,
    /// `Some(None)` clears the reminder.
    pub reminder_at: Option<Option<Timestamp>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.priority.is_none()
            && self.tags.is_none()
            && self.reminder_at.is_none()
    }
}

/// A completed focus interval.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSession {
    /// What was timed, e.g. a task name or `Pomodoro: Focus`.
    pub task_name: String,
    /// Length of the interval in seconds.
    pub duration: u64,
    pub completed_at: Timestamp,
}

/// Trims, drops empty entries and de-duplicates tags, keeping first-seen order.
pub fn normalize_tags<I, S>(tags: I) -> IndexSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Splits comma-separated tag input, e.g. `"work, home,,work"`.
pub fn parse_tags(input: &str) -> Vec<String> {
    normalize_tags(input.split(',')).into_iter().collect()
}
