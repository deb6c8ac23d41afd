use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::models::{Priority, Task};

/// Field the task list is ordered by within the open/done partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Manual,
    DueDate,
    Priority,
    CreationDate,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [
        SortKey::Manual,
        SortKey::DueDate,
        SortKey::Priority,
        SortKey::CreationDate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Manual => "Manual",
            SortKey::DueDate => "Due Date",
            SortKey::Priority => "Priority",
            SortKey::CreationDate => "Created",
        }
    }

    /// The key after this one, wrapping around.
    pub fn next(self) -> SortKey {
        let i = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "manual" => Ok(SortKey::Manual),
            "due" | "due-date" | "duedate" => Ok(SortKey::DueDate),
            "priority" => Ok(SortKey::Priority),
            "created" | "creation-date" | "creationdate" => Ok(SortKey::CreationDate),
            other => Err(Error::InvalidInput(format!(
                "unknown sort key '{other}'. Supported: manual, due-date, priority, created."
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flip(self) -> SortOrder {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::Asc => "Asc",
            SortOrder::Desc => "Desc",
        }
    }
}

/// Filter and sort settings for the task list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewOptions {
    /// Only tasks with this priority. `None` keeps all.
    pub priority: Option<Priority>,
    /// Only tasks carrying this tag. `None` keeps all.
    pub tag: Option<String>,
    /// Case-insensitive substring matched against text and tags.
    pub search: Option<String>,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
}

/// Filters and orders `tasks` for display.
///
/// Open tasks always come before completed ones. `sort_order` only reverses
/// the ordering inside each group, and tasks without a reminder stay last
/// when sorting by due date.
pub fn view<'a>(tasks: &'a [Task], options: &ViewOptions) -> Vec<&'a Task> {
    let query = options
        .search
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    let mut visible: Vec<&Task> = tasks
        .iter()
        .filter(|t| options.priority.is_none_or(|p| t.priority == p))
        .filter(|t| query.as_deref().is_none_or(|q| matches_query(t, q)))
        .filter(|t| options.tag.as_deref().is_none_or(|tag| t.has_tag(tag)))
        .collect();

    visible.sort_by(|a, b| compare(a, b, options.sort_key, options.sort_order));
    visible
}

fn matches_query(task: &Task, query: &str) -> bool {
    task.text.to_lowercase().contains(query)
        || task.tags.iter().any(|tag| tag.to_lowercase().contains(query))
}

fn compare(a: &Task, b: &Task, key: SortKey, order: SortOrder) -> Ordering {
    a.completed.cmp(&b.completed).then_with(|| {
        let directed = |o: Ordering| match order {
            SortOrder::Asc => o,
            SortOrder::Desc => o.reverse(),
        };
        match key {
            SortKey::Manual => directed(a.order.cmp(&b.order)),
            SortKey::Priority => directed(a.priority.cmp(&b.priority)),
            SortKey::CreationDate => directed(a.id.cmp(&b.id)),
            SortKey::DueDate => match (a.reminder_at, b.reminder_at) {
                (Some(x), Some(y)) => directed(x.cmp(&y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
    })
}

/// Moves `dragged` to just before `target` in manual order and renumbers
/// every task's `order` to its new position.
///
/// Returns `false`, leaving `tasks` untouched, when either id is unknown or
/// both are the same.
pub fn reorder(tasks: &mut Vec<Task>, dragged: i64, target: i64) -> bool {
    if dragged == target
        || !tasks.iter().any(|t| t.id == dragged)
        || !tasks.iter().any(|t| t.id == target)
    {
        return false;
    }
    tasks.sort_by_key(|t| t.order);
    let Some(from) = tasks.iter().position(|t| t.id == dragged) else {
        return false;
    };
    let moved = tasks.remove(from);
    let to = tasks.iter().position(|t| t.id == target).unwrap_or(tasks.len());
    tasks.insert(to, moved);
    for (index, task) in tasks.iter_mut().enumerate() {
        task.order = index as i64;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::normalize_tags;

    fn task(id: i64, text: &str) -> Task {
        Task {
            id,
            text: text.into(),
            completed: false,
            priority: Priority::B,
            order: id,
            completed_at: None,
            reminder_at: None,
            reminder_notified: false,
            tags: Default::default(),
        }
    }

    fn ids(tasks: &[&Task]) -> Vec<i64> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn due_date_without_reminder_goes_last() {
        let mut none = task(1, "none");
        none.reminder_at = None;
        let mut late = task(2, "late");
        late.reminder_at = Some(200);
        let mut early = task(3, "early");
        early.reminder_at = Some(100);
        let tasks = vec![none, late, early];

        let mut options = ViewOptions { sort_key: SortKey::DueDate, ..Default::default() };
        assert_eq!(ids(&view(&tasks, &options)), vec![3, 2, 1]);

        options.sort_order = SortOrder::Desc;
        assert_eq!(ids(&view(&tasks, &options)), vec![2, 3, 1]);
    }

    #[test]
    fn completed_tasks_stay_after_open_ones_in_both_directions() {
        let mut done = task(1, "done");
        done.completed = true;
        let tasks = vec![done, task(2, "b"), task(3, "c")];
        for order in [SortOrder::Asc, SortOrder::Desc] {
            for key in SortKey::ALL {
                let options = ViewOptions { sort_key: key, sort_order: order, ..Default::default() };
                let out = view(&tasks, &options);
                assert_eq!(out.last().unwrap().id, 1, "{key:?} {order:?}");
            }
        }
    }

    #[test]
    fn priority_sort_is_alphabetical() {
        let mut a = task(1, "a");
        a.priority = Priority::C;
        let mut b = task(2, "b");
        b.priority = Priority::A;
        let c = task(3, "c");
        let tasks = vec![a, b, c];
        let options = ViewOptions { sort_key: SortKey::Priority, ..Default::default() };
        assert_eq!(ids(&view(&tasks, &options)), vec![2, 3, 1]);
    }

    #[test]
    fn search_matches_text_or_tags_case_insensitively() {
        let mut tagged = task(1, "Call mom");
        tagged.tags = normalize_tags(["Family"]);
        let tasks = vec![tagged, task(2, "Buy MILK"), task(3, "Other")];

        let search = |q: &str| {
            let options = ViewOptions { search: Some(q.into()), ..Default::default() };
            ids(&view(&tasks, &options))
        };
        assert_eq!(search("milk"), vec![2]);
        assert_eq!(search("family"), vec![1]);
        assert_eq!(search("   "), vec![1, 2, 3]);
    }

    #[test]
    fn priority_and_tag_filters_combine() {
        let mut a = task(1, "a");
        a.priority = Priority::A;
        a.tags = normalize_tags(["work"]);
        let mut b = task(2, "b");
        b.tags = normalize_tags(["work"]);
        let mut c = task(3, "c");
        c.priority = Priority::A;
        let tasks = vec![a, b, c];

        let options = ViewOptions {
            priority: Some(Priority::A),
            tag: Some("work".into()),
            ..Default::default()
        };
        assert_eq!(ids(&view(&tasks, &options)), vec![1]);
    }

    #[test]
    fn reorder_inserts_before_target_and_renumbers() {
        let mut tasks = vec![task(10, "a"), task(20, "b"), task(30, "c"), task(40, "d")];
        assert!(reorder(&mut tasks, 40, 20));
        let order: Vec<(i64, i64)> = tasks.iter().map(|t| (t.id, t.order)).collect();
        assert_eq!(order, vec![(10, 0), (40, 1), (20, 2), (30, 3)]);

        assert!(reorder(&mut tasks, 10, 30));
        let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![40, 20, 10, 30]);
    }

    #[test]
    fn reorder_ignores_unknown_or_identical_ids() {
        let mut tasks = vec![task(1, "a"), task(2, "b")];
        assert!(!reorder(&mut tasks, 1, 1));
        assert!(!reorder(&mut tasks, 1, 99));
        assert!(!reorder(&mut tasks, 99, 1));
        assert_eq!(tasks[0].order, 1);
    }

    #[test]
    fn manual_view_is_stable_under_renumbering() {
        let mut tasks = vec![task(5, "a"), task(3, "b"), task(9, "c")];
        tasks[0].order = 2;
        tasks[1].order = 2;
        let options = ViewOptions::default();
        let before = ids(&view(&tasks, &options));

        let mut renumbered = tasks.clone();
        for (index, id) in before.iter().enumerate() {
            if let Some(t) = renumbered.iter_mut().find(|t| t.id == *id) {
                t.order = index as i64;
            }
        }
        assert_eq!(ids(&view(&renumbered, &options)), before);
    }

    #[test]
    fn sort_key_parses_cli_spellings() {
        assert_eq!("due-date".parse::<SortKey>().unwrap(), SortKey::DueDate);
        assert_eq!("creationDate".parse::<SortKey>().unwrap(), SortKey::CreationDate);
        assert_eq!("Manual".parse::<SortKey>().unwrap(), SortKey::Manual);
        assert!("random".parse::<SortKey>().is_err());
        assert_eq!(SortKey::CreationDate.next(), SortKey::Manual);
    }
}
