use chrono::{DateTime, FixedOffset, TimeZone};
use pretty_assertions::assert_eq;

use zenith::models::{Priority, Task, TimerSession};
use zenith::stats::{compute_stats, DashboardStats, DEFAULT_WEEKLY_GOAL_MINUTES};

fn tz() -> FixedOffset {
    FixedOffset::east_opt(2 * 3600).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
    tz().with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn session(minutes: u64, when: DateTime<FixedOffset>) -> TimerSession {
    TimerSession {
        task_name: "Focus".into(),
        duration: minutes * 60,
        completed_at: when.timestamp_millis(),
    }
}

fn done_task(id: i64, when: DateTime<FixedOffset>) -> Task {
    Task {
        id,
        text: format!("task {id}"),
        completed: true,
        priority: Priority::B,
        order: id,
        completed_at: Some(when.timestamp_millis()),
        reminder_at: None,
        reminder_notified: false,
        tags: Default::default(),
    }
}

#[test]
fn empty_history_is_all_zero() {
    let stats = compute_stats(&[], &[], &at(2024, 6, 12, 12, 0), DEFAULT_WEEKLY_GOAL_MINUTES);
    assert_eq!(
        stats,
        DashboardStats { today_focus_minutes: 0, tasks_done_today: 0, weekly_goal_percent: 0.0, streak: 0 }
    );
}

#[test]
fn streak_stops_at_first_gap() {
    // Wednesday 12 June; activity on 12, 11, 10 and 7 June.
    let now = at(2024, 6, 12, 18, 0);
    let tasks = vec![done_task(1, at(2024, 6, 12, 9, 0)), done_task(2, at(2024, 6, 7, 9, 0))];
    let sessions = vec![session(25, at(2024, 6, 11, 10, 0)), session(25, at(2024, 6, 10, 23, 30))];

    let stats = compute_stats(&tasks, &sessions, &now, DEFAULT_WEEKLY_GOAL_MINUTES);
    assert_eq!(stats.streak, 3);
}

#[test]
fn streak_is_zero_without_activity_today() {
    let now = at(2024, 6, 12, 18, 0);
    let sessions = vec![session(25, at(2024, 6, 11, 10, 0)), session(25, at(2024, 6, 10, 10, 0))];
    assert_eq!(compute_stats(&[], &sessions, &now, 300).streak, 0);
}

#[test]
fn reopened_tasks_do_not_count() {
    let now = at(2024, 6, 12, 18, 0);
    let mut task = done_task(1, at(2024, 6, 12, 9, 0));
    task.completed = false;
    let stats = compute_stats(&[task], &[], &now, 300);
    assert_eq!(stats.tasks_done_today, 0);
    assert_eq!(stats.streak, 0);
}

#[test]
fn today_uses_local_calendar_day() {
    let now = at(2024, 6, 12, 18, 0);
    let tasks = vec![
        done_task(1, at(2024, 6, 12, 0, 5)),
        done_task(2, at(2024, 6, 12, 17, 0)),
        done_task(3, at(2024, 6, 11, 23, 55)),
    ];
    // 00:30 local is still the previous UTC day, but counts as today here.
    let sessions = vec![
        session(25, at(2024, 6, 12, 0, 30)),
        session(50, at(2024, 6, 12, 15, 0)),
        session(90, at(2024, 6, 11, 20, 0)),
    ];

    let stats = compute_stats(&tasks, &sessions, &now, 300);
    assert_eq!(stats.tasks_done_today, 2);
    assert_eq!(stats.today_focus_minutes, 75);
}

#[test]
fn focus_minutes_round_down() {
    let now = at(2024, 6, 12, 18, 0);
    let sessions = vec![TimerSession {
        task_name: "Short".into(),
        duration: 119,
        completed_at: at(2024, 6, 12, 10, 0).timestamp_millis(),
    }];
    assert_eq!(compute_stats(&[], &sessions, &now, 300).today_focus_minutes, 1);
}

#[test]
fn weekly_goal_counts_from_monday() {
    // Monday 10 June to Wednesday 12 June: 150 minutes. Sunday 9 June is last week.
    let now = at(2024, 6, 12, 18, 0);
    let sessions = vec![
        session(60, at(2024, 6, 10, 0, 1)),
        session(40, at(2024, 6, 11, 12, 0)),
        session(50, at(2024, 6, 12, 12, 0)),
        session(500, at(2024, 6, 9, 23, 59)),
    ];

    let stats = compute_stats(&[], &sessions, &now, 300);
    assert_eq!(stats.weekly_goal_percent, 50.0);
}

#[test]
fn weekly_goal_is_capped() {
    let now = at(2024, 6, 12, 18, 0);
    let sessions = vec![session(400, at(2024, 6, 12, 8, 0))];
    assert_eq!(compute_stats(&[], &sessions, &now, 300).weekly_goal_percent, 100.0);
}

#[test]
fn weekly_goal_follows_configured_target() {
    let now = at(2024, 6, 12, 18, 0);
    let sessions = vec![session(30, at(2024, 6, 12, 8, 0))];
    assert_eq!(compute_stats(&[], &sessions, &now, 120).weekly_goal_percent, 25.0);
}
