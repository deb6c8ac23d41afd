use std::time::{Duration, Instant};

use ratatui::widgets::TableState;

use crate::commands::{format_timestamp, parse_reminder};
use crate::config::Config;
use crate::models::{now_millis, parse_tags, Priority, Task, TaskDraft, TaskPatch};
use crate::repository::TaskRepository;
use crate::sessions::SessionLog;
use crate::stats::{compute_stats, DashboardStats};
use crate::storage::Store;
use crate::timer::{Timer, TimerMode};
use crate::view::{view, SortKey, ViewOptions};

#[derive(PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
    Adding,
    Searching,
    ConfirmDelete,
}

#[derive(PartialEq)]
pub enum InputField {
    None,
    Text,
    Tags,
    Reminder,
    TimerName,
    TimerMinutes,
}

/// State for the multi-step "Add Task" wizard.
#[derive(Default)]
pub struct AddState {
    pub text: String,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub step: usize, // 0: Text, 1: Priority, 2: Tags, 3: Reminder
}

pub struct App {
    pub store: Store,
    pub config: Config,
    pub repo: TaskRepository,
    pub sessions: SessionLog,
    pub timer: Timer,
    pub options: ViewOptions,
    pub stats: DashboardStats,
    pub state: TableState,
    pub input_mode: InputMode,
    pub input_field: InputField,
    pub input_buffer: String,
    pub target_id: Option<i64>,
    pub add_state: AddState,
    /// Task picked up for manual reordering.
    pub picked: Option<i64>,
    /// Last message for the user: reminders, timer events, errors.
    pub notice: Option<String>,
    last_reminder_check: Instant,
}

impl App {
    /// Creates a new App instance and loads initial data.
    pub fn new(store: Store, config: Config) -> App {
        let repo = TaskRepository::open(store.clone(), now_millis());
        let sessions = SessionLog::open(store.clone());
        let timer = Timer::from_config(&config);
        let mut app = App {
            store,
            stats: compute_stats(&[], &[], &chrono::Local::now(), config.weekly_goal_minutes),
            config,
            repo,
            sessions,
            timer,
            options: ViewOptions::default(),
            state: TableState::default(),
            input_mode: InputMode::Normal,
            input_field: InputField::None,
            input_buffer: String::new(),
            target_id: None,
            add_state: AddState::default(),
            picked: None,
            notice: None,
            last_reminder_check: Instant::now(),
        };
        app.refresh();
        app
    }

    /// Tasks currently shown, in display order.
    pub fn visible(&self) -> Vec<&Task> {
        view(self.repo.tasks(), &self.options)
    }

    pub fn selected_id(&self) -> Option<i64> {
        let i = self.state.selected()?;
        self.visible().get(i).map(|t| t.id)
    }

    /// Recomputes stats and keeps the selection inside the visible list.
    pub fn refresh(&mut self) {
        self.stats = compute_stats(
            self.repo.tasks(),
            self.sessions.all(),
            &chrono::Local::now(),
            self.config.weekly_goal_minutes,
        );
        let len = self.visible().len();
        if len == 0 {
            self.state.select(None);
        } else if let Some(i) = self.state.selected() {
            if i >= len {
                self.state.select(Some(len - 1));
            }
        } else {
            self.state.select(Some(0));
        }
    }

    fn report<T>(&mut self, result: crate::error::Result<T>) {
        if let Err(e) = result {
            tracing::error!(error = %e, "failed to save");
            self.notice = Some(format!("Failed to save: {}", e));
        }
    }

    /// Selects the next task in the list.
    pub fn next(&mut self) {
        let len = self.visible().len();
        if len == 0 { return; }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    /// Selects the previous task in the list.
    pub fn previous(&mut self) {
        let len = self.visible().len();
        if len == 0 { return; }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    /// Toggles completion of the selected task.
    pub fn toggle_selected(&mut self) {
        if let Some(id) = self.selected_id() {
            let result = self.repo.toggle(id, now_millis());
            self.report(result);
            self.refresh();
        }
    }

    /// Asks for confirmation before deleting the selected task.
    pub fn request_delete(&mut self) {
        if let Some(id) = self.selected_id() {
            self.target_id = Some(id);
            self.input_mode = InputMode::ConfirmDelete;
        }
    }

    pub fn confirm_delete(&mut self, confirmed: bool) {
        if let (true, Some(id)) = (confirmed, self.target_id) {
            let result = self.repo.delete(id);
            self.report(result);
            if self.picked == Some(id) {
                self.picked = None;
            }
        }
        self.target_id = None;
        self.input_mode = InputMode::Normal;
        self.refresh();
    }

    /// Sets the priority of the selected task.
    pub fn set_priority(&mut self, priority: Priority) {
        if let Some(id) = self.selected_id() {
            let result = self.repo.update(id, TaskPatch { priority: Some(priority), ..Default::default() });
            self.report(result);
            self.refresh();
        }
    }

    pub fn cycle_priority_filter(&mut self) {
        self.options.priority = match self.options.priority {
            None => Some(Priority::A),
            Some(Priority::A) => Some(Priority::B),
            Some(Priority::B) => Some(Priority::C),
            Some(Priority::C) => None,
        };
        self.refresh();
    }

    /// Steps through "all" and then every registered tag.
    pub fn cycle_tag_filter(&mut self) {
        let tags: Vec<&String> = self.repo.tags().iter().collect();
        self.options.tag = match &self.options.tag {
            None => tags.first().map(|t| t.to_string()),
            Some(current) => tags
                .iter()
                .position(|t| *t == current)
                .and_then(|i| tags.get(i + 1))
                .map(|t| t.to_string()),
        };
        self.refresh();
    }

    pub fn cycle_sort(&mut self) {
        self.options.sort_key = self.options.sort_key.next();
        self.refresh();
    }

    pub fn flip_order(&mut self) {
        self.options.sort_order = self.options.sort_order.flip();
        self.refresh();
    }

    /// Picks up the selected task, or drops the picked one before the selection.
    ///
    /// Dropping switches back to manual sort so the move is visible.
    pub fn pick_or_drop(&mut self) {
        let Some(selected) = self.selected_id() else { return; };
        match self.picked.take() {
            None => self.picked = Some(selected),
            Some(dragged) => {
                let result = self.repo.reorder(dragged, selected);
                self.report(result);
                self.options.sort_key = SortKey::Manual;
                self.refresh();
                if let Some(i) = self.visible().iter().position(|t| t.id == dragged) {
                    self.state.select(Some(i));
                }
            }
        }
    }

    pub fn start_search(&mut self) {
        self.input_mode = InputMode::Searching;
        self.input_buffer = self.options.search.clone().unwrap_or_default();
    }

    /// Live-updates the search as the user types.
    pub fn update_search(&mut self) {
        self.options.search = Some(self.input_buffer.clone()).filter(|s| !s.trim().is_empty());
        self.refresh();
    }

    /// Initiates the "Add Task" wizard.
    pub fn start_add(&mut self) {
        self.input_mode = InputMode::Adding;
        self.add_state = AddState::default();
        self.input_buffer.clear();
    }

    /// Initiates editing of a field of the selected task or of the timer.
    pub fn start_edit(&mut self, field: InputField) {
        self.input_buffer.clear();
        match field {
            InputField::TimerName => {
                self.input_buffer = self.timer.task_name().to_string();
            }
            InputField::TimerMinutes => {
                if self.timer.mode() == TimerMode::Pomodoro || self.timer.is_running() {
                    return;
                }
                self.input_buffer = self.timer.interval_minutes().to_string();
            }
            InputField::Text | InputField::Tags | InputField::Reminder => {
                let Some(task) = self.selected_id().and_then(|id| self.repo.get(id)) else { return; };
                self.target_id = Some(task.id);
                self.input_buffer = match field {
                    InputField::Text => task.text.clone(),
                    InputField::Tags => task.tags.iter().cloned().collect::<Vec<_>>().join(", "),
                    _ => task.reminder_at.map(format_timestamp).unwrap_or_default(),
                };
            }
            InputField::None => return,
        }
        self.input_field = field;
        self.input_mode = InputMode::Editing;
    }

    /// Handles text input based on the current mode.
    pub fn handle_input(&mut self) {
        match self.input_mode {
            InputMode::Adding => self.handle_adding_input(),
            InputMode::Editing => self.handle_editing_input(),
            InputMode::Searching => {
                self.update_search();
                self.input_mode = InputMode::Normal;
            }
            _ => {}
        }
    }

    pub fn cancel_input(&mut self) {
        if self.input_mode == InputMode::ConfirmDelete {
            self.confirm_delete(false);
            return;
        }
        if self.input_mode == InputMode::Searching {
            self.options.search = None;
            self.refresh();
        }
        self.input_mode = InputMode::Normal;
        self.input_field = InputField::None;
        self.input_buffer.clear();
    }

    /// Handles input for the "Add Task" wizard.
    fn handle_adding_input(&mut self) {
        match self.add_state.step {
            0 => { // Text
                if !self.input_buffer.trim().is_empty() {
                    self.add_state.text = self.input_buffer.trim().to_string();
                    self.add_state.step += 1;
                    self.input_buffer.clear();
                }
            }
            1 => { // Priority
                if self.input_buffer.trim().is_empty() {
                    self.add_state.priority = Priority::B;
                } else if let Ok(p) = self.input_buffer.parse::<Priority>() {
                    self.add_state.priority = p;
                } else {
                    return;
                }
                self.add_state.step += 1;
                self.input_buffer.clear();
            }
            2 => { // Tags
                self.add_state.tags = parse_tags(&self.input_buffer);
                self.add_state.step += 1;
                self.input_buffer.clear();
            }
            3 => { // Reminder
                let reminder_at = if self.input_buffer.trim().is_empty() {
                    None
                } else {
                    match parse_reminder(&self.input_buffer) {
                        Ok(ts) => Some(ts),
                        Err(e) => {
                            self.notice = Some(e.to_string());
                            return;
                        }
                    }
                };
                let draft = TaskDraft {
                    text: std::mem::take(&mut self.add_state.text),
                    priority: self.add_state.priority,
                    tags: std::mem::take(&mut self.add_state.tags),
                    reminder_at,
                };
                let result = self.repo.add(draft, now_millis());
                self.report(result);
                self.input_buffer.clear();
                self.input_mode = InputMode::Normal;
                self.refresh();
            }
            _ => {}
        }
    }

    /// Handles input for the "Edit" mode.
    fn handle_editing_input(&mut self) {
        let input = std::mem::take(&mut self.input_buffer);
        match self.input_field {
            InputField::TimerName => self.timer.set_task_name(input.trim()),
            InputField::TimerMinutes => match input.trim().parse::<u64>() {
                Ok(m) => self.timer.set_custom_minutes(m),
                Err(_) => self.notice = Some(format!("Invalid duration '{}'.", input.trim())),
            },
            InputField::Text | InputField::Tags | InputField::Reminder => {
                if let Some(id) = self.target_id {
                    let patch = match self.input_field {
                        InputField::Text if !input.trim().is_empty() => {
                            Some(TaskPatch { text: Some(input), ..Default::default() })
                        }
                        InputField::Tags => Some(TaskPatch { tags: Some(parse_tags(&input)), ..Default::default() }),
                        InputField::Reminder if input.trim().is_empty() => {
                            Some(TaskPatch { reminder_at: Some(None), ..Default::default() })
                        }
                        InputField::Reminder => match parse_reminder(&input) {
                            Ok(ts) => Some(TaskPatch { reminder_at: Some(Some(ts)), ..Default::default() }),
                            Err(e) => {
                                self.notice = Some(e.to_string());
                                None
                            }
                        },
                        _ => None,
                    };
                    if let Some(patch) = patch {
                        let result = self.repo.update(id, patch);
                        self.report(result);
                    }
                }
            }
            InputField::None => {}
        }
        self.input_mode = InputMode::Normal;
        self.input_field = InputField::None;
        self.target_id = None;
        self.refresh();
    }

    pub fn toggle_timer(&mut self) {
        self.timer.toggle_running();
    }

    pub fn reset_timer(&mut self) {
        self.timer.reset(true);
    }

    /// Switches between a custom countdown and the Pomodoro cycle.
    pub fn switch_timer_mode(&mut self) {
        let mode = match self.timer.mode() {
            TimerMode::Custom { .. } => TimerMode::Pomodoro,
            TimerMode::Pomodoro => TimerMode::Custom { minutes: self.config.custom_minutes },
        };
        self.timer.set_mode(mode);
    }

    /// Runs once per second: advances the timer and logs finished sessions.
    pub fn on_tick(&mut self) {
        if let Some(event) = self.timer.tick(now_millis()) {
            if let Some(session) = event.session {
                let result = self.sessions.append(session);
                self.report(result);
            }
            self.notice = Some(event.message);
        }
        self.refresh();
    }

    /// Scans for due reminders when the configured interval has passed.
    pub fn poll_reminders(&mut self) {
        let interval = Duration::from_secs(self.config.reminder_interval_secs);
        if self.last_reminder_check.elapsed() < interval {
            return;
        }
        self.last_reminder_check = Instant::now();
        self.deliver_reminders();
    }

    /// Shows every due reminder once and marks it delivered.
    pub fn deliver_reminders(&mut self) {
        let due = self.repo.check_reminders(now_millis());
        if due.is_empty() {
            return;
        }
        let texts: Vec<&str> = due.iter().map(|t| t.text.as_str()).collect();
        self.notice = Some(format!("Task Reminder: {}", texts.join(" | ")));
        let ids: Vec<i64> = due.iter().map(|t| t.id).collect();
        let result = self.repo.mark_notified(&ids);
        self.report(result);
    }
}
