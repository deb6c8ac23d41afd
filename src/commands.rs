use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use tracing::error;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{now_millis, parse_tags, Priority, TaskDraft, TaskPatch, Timestamp};
use crate::repository::TaskRepository;
use crate::sessions::SessionLog;
use crate::stats::compute_stats;
use crate::storage::Store;
use crate::timer::{Timer, TimerMode};
use crate::view::{view, SortKey, SortOrder, ViewOptions};

/// Parses a reminder given as `YYYY-MM-DD HH:MM` or `YYYY-MM-DD` (09:00) in local time.
pub fn parse_reminder(input: &str) -> Result<Timestamp> {
    let input = input.trim();
    let naive = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M"))
        .or_else(|_| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d").map(|d| d.and_time(default_reminder_time()))
        })
        .map_err(|e| {
            Error::InvalidInput(format!("Invalid reminder '{input}': {e}. Use YYYY-MM-DD [HH:MM]."))
        })?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .ok_or_else(|| Error::InvalidInput(format!("Reminder '{input}' does not exist in local time.")))
}

fn default_reminder_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Formats a timestamp as local `YYYY-MM-DD HH:MM`.
pub fn format_timestamp(ts: Timestamp) -> String {
    Local
        .timestamp_millis_opt(ts)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn open_repo(store: &Store) -> TaskRepository {
    TaskRepository::open(store.clone(), now_millis())
}

fn report_save_error(e: &Error, silent: bool) {
    error!(error = %e, "failed to save");
    if !silent {
        eprintln!("Failed to save tasks: {}", e);
    }
}

/// Adds a new task.
///
/// Blank text is rejected here, before it reaches the repository.
pub fn cmd_add(
    store: &Store,
    text: String,
    priority: Option<String>,
    tags: Option<String>,
    reminder: Option<String>,
    silent: bool,
) {
    if text.trim().is_empty() {
        if !silent { eprintln!("Task text cannot be empty."); }
        return;
    }
    let priority = match priority.as_deref().map(str::parse::<Priority>).transpose() {
        Ok(p) => p.unwrap_or_default(),
        Err(e) => {
            if !silent { eprintln!("{}", e); }
            return;
        }
    };
    let reminder_at = match reminder.as_deref().map(parse_reminder).transpose() {
        Ok(r) => r,
        Err(e) => {
            if !silent { eprintln!("{}", e); }
            return;
        }
    };
    let draft = TaskDraft {
        text,
        priority,
        tags: tags.as_deref().map(parse_tags).unwrap_or_default(),
        reminder_at,
    };

    let mut repo = open_repo(store);
    match repo.add(draft, now_millis()) {
        Ok(Some(id)) => {
            if !silent { println!("Task added (id = {})", id); }
        }
        Ok(None) => {
            if !silent { eprintln!("Task text cannot be empty."); }
        }
        Err(e) => report_save_error(&e, silent),
    }
}

/// Flips a task between open and completed.
pub fn cmd_toggle(store: &Store, id: i64, silent: bool) {
    let mut repo = open_repo(store);
    match repo.toggle(id, now_millis()) {
        Ok(true) => {
            if !silent {
                let done = repo.get(id).is_some_and(|t| t.completed);
                println!("Task {} marked as {}.", id, if done { "complete" } else { "open" });
            }
        }
        Ok(false) => {
            if !silent { eprintln!("Task {} not found.", id); }
        }
        Err(e) => report_save_error(&e, silent),
    }
}

/// Edits an existing task's details.
#[allow(clippy::too_many_arguments)]
pub fn cmd_edit(
    store: &Store,
    id: i64,
    text: Option<String>,
    priority: Option<String>,
    tags: Option<String>,
    reminder: Option<String>,
    clear_reminder: bool,
    silent: bool,
) {
    let mut patch = TaskPatch::default();
    if let Some(t) = text {
        if t.trim().is_empty() {
            if !silent { eprintln!("Task text cannot be empty."); }
            return;
        }
        patch.text = Some(t);
    }
    if let Some(p) = priority {
        match p.parse::<Priority>() {
            Ok(p) => patch.priority = Some(p),
            Err(e) => {
                if !silent { eprintln!("{}", e); }
                return;
            }
        }
    }
    if let Some(t) = tags {
        patch.tags = Some(parse_tags(&t));
    }
    if clear_reminder {
        patch.reminder_at = Some(None);
    } else if let Some(r) = reminder {
        match parse_reminder(&r) {
            Ok(ts) => patch.reminder_at = Some(Some(ts)),
            Err(e) => {
                if !silent { eprintln!("{}", e); }
                return;
            }
        }
    }
    if patch.is_empty() {
        if !silent { eprintln!("Nothing to update."); }
        return;
    }

    let mut repo = open_repo(store);
    match repo.update(id, patch) {
        Ok(true) => {
            if !silent { println!("Task {} updated.", id); }
        }
        Ok(false) => {
            if !silent { eprintln!("Task {} not found.", id); }
        }
        Err(e) => report_save_error(&e, silent),
    }
}

/// Removes a task after confirmation, unless `force` is set.
pub fn cmd_remove(store: &Store, id: i64, force: bool, silent: bool) {
    let mut repo = open_repo(store);
    let Some(task) = repo.get(id) else {
        if !silent { eprintln!("Task {} not found.", id); }
        return;
    };

    if !force {
        print!("Are you sure you want to permanently delete this task?\n\n\"{}\"\n[y/N] ", task.text);
        let _ = io::stdout().flush();
        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() || input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return;
        }
    }

    match repo.delete(id) {
        Ok(_) => {
            if !silent { println!("Task {} removed.", id); }
        }
        Err(e) => report_save_error(&e, silent),
    }
}

/// Moves a task just before another one in manual order.
pub fn cmd_move(store: &Store, id: i64, before: i64, silent: bool) {
    let mut repo = open_repo(store);
    match repo.reorder(id, before) {
        Ok(true) => {
            if !silent { println!("Task {} moved before task {}. Showing manual order:", id, before); }
            if !silent { print_tasks(&repo, &ViewOptions::default()); }
        }
        Ok(false) => {
            if !silent { eprintln!("Cannot move task {} before task {}.", id, before); }
        }
        Err(e) => report_save_error(&e, silent),
    }
}

/// Filter and sort arguments for [`cmd_list`].
#[derive(Debug, Default)]
pub struct ListArgs {
    pub priority: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub desc: bool,
}

impl ListArgs {
    /// Validates the raw arguments into view options.
    pub fn into_options(self) -> Result<ViewOptions> {
        Ok(ViewOptions {
            priority: self.priority.as_deref().map(str::parse::<Priority>).transpose()?,
            tag: self.tag.filter(|t| !t.trim().is_empty()).map(|t| t.trim().to_string()),
            search: self.search,
            sort_key: self
                .sort
                .as_deref()
                .map(str::parse::<SortKey>)
                .transpose()?
                .unwrap_or_default(),
            sort_order: if self.desc { SortOrder::Desc } else { SortOrder::Asc },
        })
    }
}

/// Lists tasks in a formatted table.
pub fn cmd_list(store: &Store, args: ListArgs) {
    let options = match args.into_options() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };
    let repo = open_repo(store);
    print_tasks(&repo, &options);
}

fn print_tasks(repo: &TaskRepository, options: &ViewOptions) {
    if repo.tasks().is_empty() {
        println!("No tasks yet. Add one to get started!");
        return;
    }
    let visible = view(repo.tasks(), options);
    if visible.is_empty() {
        println!("No tasks match your current filters.");
    } else {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("ID").add_attribute(Attribute::Bold),
                Cell::new("Task").add_attribute(Attribute::Bold),
                Cell::new("Priority").add_attribute(Attribute::Bold),
                Cell::new("Tags").add_attribute(Attribute::Bold),
                Cell::new("Reminder").add_attribute(Attribute::Bold),
                Cell::new("Status").add_attribute(Attribute::Bold),
            ]);

        let now = now_millis();
        for t in visible {
            let priority_color = match t.priority {
                Priority::A => Color::Red,
                Priority::B => Color::Yellow,
                Priority::C => Color::Cyan,
            };
            let reminder_color = if t.reminder_due(now) { Color::Red } else { Color::Reset };
            let status = if t.completed { "Done" } else { "Pending" };
            let status_color = if t.completed { Color::Green } else { Color::Yellow };

            table.add_row(vec![
                Cell::new(t.id),
                Cell::new(&t.text),
                Cell::new(t.priority.label()).fg(priority_color),
                Cell::new(t.tags.iter().cloned().collect::<Vec<_>>().join(", ")),
                Cell::new(t.reminder_at.map(format_timestamp).unwrap_or_default()).fg(reminder_color),
                Cell::new(status).fg(status_color),
            ]);
        }
        println!("{table}");
    }
    println!("{} of {} tasks completed.", repo.completed_count(), repo.tasks().len());
}

/// Prints the tag registry.
pub fn cmd_tags(store: &Store) {
    let repo = open_repo(store);
    if repo.tags().is_empty() {
        println!("No tags found.");
        return;
    }
    for tag in repo.tags() {
        println!("{tag}");
    }
}

/// Prints due reminders once and marks them as delivered.
pub fn cmd_remind(store: &Store, silent: bool) -> usize {
    let mut repo = open_repo(store);
    let due = repo.check_reminders(now_millis());
    if due.is_empty() {
        if !silent { println!("No reminders due."); }
        return 0;
    }
    for task in &due {
        if !silent { println!("Task Reminder: {}", task.text); }
    }
    let ids: Vec<i64> = due.iter().map(|t| t.id).collect();
    if let Err(e) = repo.mark_notified(&ids) {
        report_save_error(&e, silent);
    }
    due.len()
}

/// Prints today's focus, tasks done, streak and weekly goal progress.
pub fn cmd_stats(store: &Store, config: &Config) {
    let repo = open_repo(store);
    let log = SessionLog::open(store.clone());
    let stats = compute_stats(repo.tasks(), log.all(), &Local::now(), config.weekly_goal_minutes);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        Cell::new("Today's Focus").add_attribute(Attribute::Bold),
        Cell::new("Tasks Done").add_attribute(Attribute::Bold),
        Cell::new("Streak").add_attribute(Attribute::Bold),
        Cell::new("Weekly Goal").add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new(format!("{}m", stats.today_focus_minutes)).fg(Color::Cyan),
        Cell::new(stats.tasks_done_today).fg(Color::Cyan),
        Cell::new(format!("{} days", stats.streak)).fg(Color::Cyan),
        Cell::new(format!("{:.0}%", stats.weekly_goal_percent)).fg(Color::Cyan),
    ]);
    println!("{table}");
}

/// Lists logged timer sessions.
pub fn cmd_sessions(store: &Store) {
    let log = SessionLog::open(store.clone());
    if log.all().is_empty() {
        println!("No sessions logged.");
        return;
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Task", "Minutes", "Completed"]);
    for s in log.all() {
        table.add_row(vec![
            s.task_name.clone(),
            format!("{}", s.duration / 60),
            format_timestamp(s.completed_at),
        ]);
    }
    println!("{table}");
}

/// Runs one timer interval in the foreground and logs it when it completes.
pub fn cmd_timer(store: &Store, config: &Config, minutes: Option<u64>, pomodoro: bool, name: Option<String>) {
    let mode = if pomodoro {
        TimerMode::Pomodoro
    } else {
        TimerMode::Custom { minutes: minutes.unwrap_or(config.custom_minutes).max(1) }
    };
    let mut timer = Timer::new(mode, config.pomodoro);
    if let Some(n) = name {
        timer.set_task_name(n);
    }
    timer.start();

    let event = loop {
        print!("\r{} ", timer.formatted_remaining());
        let _ = io::stdout().flush();
        thread::sleep(Duration::from_secs(1));
        if let Some(event) = timer.tick(now_millis()) {
            break event;
        }
    };
    println!("\r{}", event.message);

    if let Some(session) = event.session {
        let mut log = SessionLog::open(store.clone());
        if let Err(e) = log.append(session) {
            error!(error = %e, "failed to save session");
            eprintln!("Failed to save session: {}", e);
        }
    }
}
