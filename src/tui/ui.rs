use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table},
    Frame,
};

use crate::commands::format_timestamp;
use crate::models::{now_millis, Priority};
use crate::quotes::quote_for;
use crate::timer::{PomodoroPhase, TimerMode};
use super::app::{App, InputField, InputMode};

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Clock + quote
            Constraint::Length(3), // Stats
            Constraint::Min(0),    // Timer + tasks
            Constraint::Length(3), // Help
        ].as_ref())
        .split(f.area());

    render_header(f, chunks[0]);
    render_stats(f, app, chunks[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(32), Constraint::Min(0)].as_ref())
        .split(chunks[2]);
    render_timer(f, app, body[0]);
    render_tasks(f, app, body[1]);
    render_help(f, app, chunks[3]);

    if app.input_mode != InputMode::Normal {
        render_input(f, app);
    }
}

fn render_header(f: &mut Frame, area: Rect) {
    let now = Local::now();
    let text = format!(
        "{}  {}\n\"{}\"",
        now.format("%I:%M:%S %p"),
        now.format("%A, %B %-d, %Y"),
        quote_for(now_millis()),
    );
    let header = Paragraph::new(text)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL).title("Zenith Productivity Dashboard"));
    f.render_widget(header, area);
}

fn render_stats(f: &mut Frame, app: &App, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25); 4].as_ref())
        .split(area);
    let stat = |title: &'static str, value: String| {
        Paragraph::new(value)
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .block(Block::default().borders(Borders::ALL).title(title))
    };
    f.render_widget(stat("Today's Focus", format!("{}m", app.stats.today_focus_minutes)), cols[0]);
    f.render_widget(stat("Tasks Done", app.stats.tasks_done_today.to_string()), cols[1]);
    f.render_widget(stat("Streak", format!("{} days", app.stats.streak)), cols[2]);

    let percent = app.stats.weekly_goal_percent.clamp(0.0, 100.0);
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Weekly Goal"))
        .gauge_style(Style::default().fg(Color::Cyan))
        .percent(percent.round() as u16);
    f.render_widget(gauge, cols[3]);
}

fn render_timer(f: &mut Frame, app: &App, area: Rect) {
    let timer = &app.timer;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(area);

    let (title, color) = match timer.mode() {
        TimerMode::Custom { .. } => ("Task Timer - Custom".to_string(), Color::Cyan),
        TimerMode::Pomodoro => {
            let color = match timer.phase() {
                PomodoroPhase::Focus => Color::Cyan,
                PomodoroPhase::ShortBreak => Color::Green,
                PomodoroPhase::LongBreak => Color::Magenta,
            };
            (format!("Task Timer - {}", timer.phase()), color)
        }
    };

    let mut lines = vec![format!("  {}", timer.formatted_remaining()), String::new()];
    match timer.mode() {
        TimerMode::Pomodoro if timer.phase() == PomodoroPhase::Focus => {
            lines.push(format!("Cycle {} of {}", timer.cycle() + 1, timer.cycles_per_round()));
        }
        TimerMode::Pomodoro => {}
        TimerMode::Custom { minutes } => {
            let name = if timer.task_name().is_empty() { "Unnamed Task" } else { timer.task_name() };
            lines.push(name.to_string());
            lines.push(format!("Duration: {} min", minutes));
        }
    }
    lines.push(if timer.is_running() { "Running".into() } else { "Paused".into() });

    let panel = Paragraph::new(lines.join("\n"))
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(panel, rows[0]);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(color))
        .ratio(timer.progress().clamp(0.0, 1.0));
    f.render_widget(gauge, rows[1]);
}

fn render_tasks(f: &mut Frame, app: &mut App, area: Rect) {
    let now = now_millis();
    let rows: Vec<Row> = app
        .visible()
        .into_iter()
        .map(|t| {
            let mut style = match t.priority {
                Priority::A => Style::default().fg(Color::Red),
                Priority::B => Style::default().fg(Color::Yellow),
                Priority::C => Style::default().fg(Color::Cyan),
            };
            if t.completed {
                style = Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT);
            }
            let marker = if app.picked == Some(t.id) { "*" } else if t.completed { "x" } else { " " };
            let reminder = match t.reminder_at {
                Some(at) if t.reminder_due(now) => format!("{} !", format_timestamp(at)),
                Some(at) => format_timestamp(at),
                None => String::new(),
            };
            Row::new(vec![
                Cell::from(marker),
                Cell::from(t.text.clone()),
                Cell::from(t.priority.label()),
                Cell::from(t.tags.iter().cloned().collect::<Vec<_>>().join(", ")),
                Cell::from(reminder),
            ]).style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(2),
        Constraint::Min(20),
        Constraint::Length(8),
        Constraint::Length(20),
        Constraint::Length(18),
    ];

    let filters = format!(
        "Priority: {} | Tag: {} | Search: {} | Sort: {} {}",
        app.options.priority.map(|p| p.label()).unwrap_or("All"),
        app.options.tag.as_deref().unwrap_or("All"),
        app.options.search.as_deref().unwrap_or("-"),
        app.options.sort_key,
        app.options.sort_order.label(),
    );
    let title = format!(
        "To-Do List ({} of {} completed) - {}",
        app.repo.completed_count(),
        app.repo.tasks().len(),
        filters
    );

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["", "Task", "Priority", "Tags", "Reminder"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .bottom_margin(1))
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_help(f: &mut Frame, app: &App, area: Rect) {
    let help_text = match app.input_mode {
        InputMode::Normal => "q: Quit | a: Add | Space: Done | d: Del | e: Text | t: Tags | r: Reminder | 1-3: Prio | f: Prio filter | g: Tag filter | /: Search | s: Sort | o: Order | m: Pick/Drop | T: Timer | R: Reset | P: Mode | n: Timer name | M: Minutes",
        InputMode::Editing | InputMode::Searching => "Enter: Save | Esc: Cancel",
        InputMode::Adding => "Enter: Next Step | Esc: Cancel",
        InputMode::ConfirmDelete => "y: Delete | n/Esc: Keep",
    };
    let title = app.notice.clone().unwrap_or_default();

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(help, area);
}

fn render_input(f: &mut Frame, app: &App) {
    let area = centered_rect(60, 3, f.area());
    f.render_widget(Clear, area);

    let confirm_title;
    let title = match app.input_mode {
        InputMode::Adding => match app.add_state.step {
            0 => "Add Task: Enter Text",
            1 => "Add Task: Priority A/B/C (Optional, default B)",
            2 => "Add Task: Tags, comma-separated (Optional)",
            3 => "Add Task: Reminder YYYY-MM-DD [HH:MM] (Optional)",
            _ => "Add Task",
        },
        InputMode::Editing => match app.input_field {
            InputField::Text => "Edit Text",
            InputField::Tags => "Edit Tags (comma-separated)",
            InputField::Reminder => "Edit Reminder YYYY-MM-DD [HH:MM] (empty clears)",
            InputField::TimerName => "Timer: Task Name",
            InputField::TimerMinutes => "Timer: Duration (minutes)",
            InputField::None => "Edit",
        },
        InputMode::Searching => "Search tasks & tags",
        InputMode::ConfirmDelete => {
            let text = app
                .target_id
                .and_then(|id| app.repo.get(id))
                .map(|t| t.text.as_str())
                .unwrap_or_default();
            confirm_title = format!("Permanently delete \"{}\"? (y/n)", text);
            confirm_title.as_str()
        }
        InputMode::Normal => "",
    };

    let body = if app.input_mode == InputMode::ConfirmDelete { "" } else { app.input_buffer.as_str() };
    let input = Paragraph::new(body)
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(input, area);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let margin = r.height.saturating_sub(height) / 2;
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(margin),
            Constraint::Length(height),
            Constraint::Length(margin),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
