use std::collections::BTreeSet;

use tracing::debug;

use crate::error::Result;
use crate::models::{normalize_tags, Task, TaskDraft, TaskPatch, Timestamp};
use crate::storage::{Store, TAGS_KEY, TASKS_KEY};
use crate::view;

/// Owns the task collection and the tag registry.
///
/// Every mutation is written through to the [`Store`] before returning.
/// Operations on unknown ids do nothing and report `false`.
pub struct TaskRepository {
    store: Store,
    tasks: Vec<Task>,
    tags: BTreeSet<String>,
}

impl TaskRepository {
    /// Loads tasks from `store` and derives the tag registry from them.
    ///
    /// The stored registry is only compared against the tasks; a missing,
    /// unreadable or stale one is replaced on the next tag change.
    pub fn open(store: Store, now: Timestamp) -> Self {
        let tasks = store.load_tasks(now);
        let tags = tags_in_use(&tasks);
        let stored: BTreeSet<String> = store.load(TAGS_KEY, tags.clone());
        if stored != tags {
            debug!(
                stale = stored.difference(&tags).count(),
                missing = tags.difference(&stored).count(),
                "stored tag registry out of date, rebuilt from tasks"
            );
        }
        Self { store, tasks, tags }
    }

    /// Tasks in storage order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Every tag in use, sorted.
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    /// Creates a task and returns its id. Blank text is ignored and yields `None`.
    pub fn add(&mut self, draft: TaskDraft, now: Timestamp) -> Result<Option<i64>> {
        let text = draft.text.trim();
        if text.is_empty() {
            debug!("ignoring task with blank text");
            return Ok(None);
        }
        let id = self.next_id(now);
        let tags = normalize_tags(&draft.tags);
        let new_tags = !tags.is_empty();
        self.tags.extend(tags.iter().cloned());

        self.tasks.push(Task {
            id,
            text: text.to_string(),
            completed: false,
            priority: draft.priority,
            order: id,
            completed_at: None,
            reminder_at: draft.reminder_at,
            reminder_notified: false,
            tags,
        });
        self.save_tasks()?;
        if new_tags {
            self.save_tags()?;
        }
        debug!(id, "task added");
        Ok(Some(id))
    }

    /// Flips completion, stamping or clearing `completed_at`.
    pub fn toggle(&mut self, id: i64, now: Timestamp) -> Result<bool> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        task.completed = !task.completed;
        task.completed_at = task.completed.then_some(now);
        debug!(id, completed = task.completed, "task toggled");
        self.save_tasks()?;
        Ok(true)
    }

    /// Merges `patch` into a task.
    ///
    /// A changed reminder is re-armed. Changed tags refresh the registry so
    /// that it holds exactly the tags still in use.
    pub fn update(&mut self, id: i64, patch: TaskPatch) -> Result<bool> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        if let Some(text) = patch.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            task.text = text.to_string();
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(reminder_at) = patch.reminder_at {
            task.reminder_at = reminder_at;
            task.reminder_notified = false;
        }
        let tags_changed = match patch.tags {
            Some(tags) => {
                task.tags = normalize_tags(&tags);
                let in_use = tags_in_use(&self.tasks);
                let mut candidates = std::mem::take(&mut self.tags);
                candidates.extend(normalize_tags(&tags));
                self.tags = candidates.intersection(&in_use).cloned().collect();
                true
            }
            None => false,
        };
        debug!(id, tags_changed, "task updated");
        self.save_tasks()?;
        if tags_changed {
            self.save_tags()?;
        }
        Ok(true)
    }

    /// Removes a task and prunes tags nothing else uses.
    pub fn delete(&mut self, id: i64) -> Result<bool> {
        let len_before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == len_before {
            return Ok(false);
        }
        let in_use = tags_in_use(&self.tasks);
        self.tags.retain(|tag| in_use.contains(tag));
        debug!(id, "task deleted");
        self.save_tasks()?;
        self.save_tags()?;
        Ok(true)
    }

    /// Open tasks whose reminder is due at `now` and has not fired yet.
    pub fn check_reminders(&self, now: Timestamp) -> Vec<Task> {
        self.tasks.iter().filter(|t| t.reminder_due(now)).cloned().collect()
    }

    /// Records that reminders for `ids` were delivered. Returns how many tasks changed.
    pub fn mark_notified(&mut self, ids: &[i64]) -> Result<usize> {
        let mut changed = 0;
        for task in self.tasks.iter_mut().filter(|t| ids.contains(&t.id)) {
            if !task.reminder_notified {
                task.reminder_notified = true;
                changed += 1;
            }
        }
        if changed > 0 {
            self.save_tasks()?;
        }
        Ok(changed)
    }

    /// Moves `dragged` just before `target` in manual order.
    pub fn reorder(&mut self, dragged: i64, target: i64) -> Result<bool> {
        if !view::reorder(&mut self.tasks, dragged, target) {
            return Ok(false);
        }
        debug!(dragged, target, "tasks reordered");
        self.save_tasks()?;
        Ok(true)
    }

    // Ids double as creation time; bump past the newest one when the clock
    // has not moved on.
    fn next_id(&self, now: Timestamp) -> i64 {
        let newest = self.tasks.iter().map(|t| t.id).max().unwrap_or(i64::MIN);
        now.max(newest.saturating_add(1))
    }

    fn save_tasks(&self) -> Result<()> {
        self.store.save(TASKS_KEY, &self.tasks)
    }

    fn save_tags(&self) -> Result<()> {
        self.store.save(TAGS_KEY, &self.tags)
    }
}

/// The union of all tasks' tags.
pub fn tags_in_use(tasks: &[Task]) -> BTreeSet<String> {
    tasks.iter().flat_map(|t| t.tags.iter().cloned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(text: &str, tags: &[&str]) -> TaskDraft {
        TaskDraft {
            text: text.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn ids_stay_unique_within_one_millisecond() {
        let mut repo = TaskRepository::open(Store::in_memory(), 0);
        let a = repo.add(draft("a", &[]), 1000).unwrap().unwrap();
        let b = repo.add(draft("b", &[]), 1000).unwrap().unwrap();
        assert_eq!(a, 1000);
        assert_eq!(b, 1001);
        assert_eq!(repo.get(b).unwrap().order, 1001);
    }

    #[test]
    fn blank_text_is_ignored() {
        let mut repo = TaskRepository::open(Store::in_memory(), 0);
        assert_eq!(repo.add(draft("   ", &["x"]), 1).unwrap(), None);
        assert!(repo.tasks().is_empty());
        assert!(repo.tags().is_empty());
    }

    #[test]
    fn blank_text_in_patch_keeps_old_text() {
        let mut repo = TaskRepository::open(Store::in_memory(), 0);
        let id = repo.add(draft("keep me", &[]), 1).unwrap().unwrap();
        let patch = TaskPatch { text: Some("  ".into()), ..Default::default() };
        assert!(repo.update(id, patch).unwrap());
        assert_eq!(repo.get(id).unwrap().text, "keep me");
    }

    #[test]
    fn corrupt_registry_is_rebuilt_from_tasks() {
        let store = Store::in_memory();
        {
            let mut repo = TaskRepository::open(store.clone(), 0);
            repo.add(draft("a", &["work", "home"]), 1).unwrap();
        }
        store.save(TAGS_KEY, &serde_json::json!({"broken": true})).unwrap();
        let repo = TaskRepository::open(store, 0);
        let tags: Vec<&str> = repo.tags().iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["home", "work"]);
    }
}
