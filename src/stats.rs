use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone};

use crate::models::{Task, TimerSession, Timestamp};

/// Weekly focus target used when no configuration says otherwise.
pub const DEFAULT_WEEKLY_GOAL_MINUTES: u64 = 300;

/// Aggregate numbers shown on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    /// Focus minutes logged today, rounded down.
    pub today_focus_minutes: u64,
    /// Tasks completed today.
    pub tasks_done_today: usize,
    /// Share of the weekly goal reached, capped at 100.
    pub weekly_goal_percent: f64,
    /// Consecutive days with activity ending today.
    pub streak: u32,
}

/// Computes the dashboard numbers as seen at `now`.
///
/// Calendar days are taken in `now`'s time zone. Weeks start on Monday.
pub fn compute_stats<Tz: TimeZone>(
    tasks: &[Task],
    sessions: &[TimerSession],
    now: &DateTime<Tz>,
    weekly_goal_minutes: u64,
) -> DashboardStats {
    let tz = now.timezone();
    let today = now.date_naive();
    let day_of = |ts: Timestamp| local_date(&tz, ts);

    let today_seconds: u64 = sessions
        .iter()
        .filter(|s| day_of(s.completed_at) == Some(today))
        .map(|s| s.duration)
        .sum();

    let tasks_done_today = tasks
        .iter()
        .filter(|t| t.completed && t.completed_at.and_then(day_of) == Some(today))
        .count();

    let week_start = start_of_week(today);
    let week_seconds: u64 = sessions
        .iter()
        .filter(|s| day_of(s.completed_at).is_some_and(|d| d >= week_start))
        .map(|s| s.duration)
        .sum();

    DashboardStats {
        today_focus_minutes: today_seconds / 60,
        tasks_done_today,
        weekly_goal_percent: goal_percent(week_seconds / 60, weekly_goal_minutes),
        streak: streak(tasks, sessions, &tz, today),
    }
}

/// Monday of the week containing `day`.
pub fn start_of_week(day: NaiveDate) -> NaiveDate {
    let back = u64::from(day.weekday().num_days_from_monday());
    day.checked_sub_days(Days::new(back)).unwrap_or(day)
}

fn goal_percent(minutes: u64, goal: u64) -> f64 {
    if goal == 0 {
        return 100.0;
    }
    (minutes as f64 / goal as f64 * 100.0).min(100.0)
}

fn streak<Tz: TimeZone>(
    tasks: &[Task],
    sessions: &[TimerSession],
    tz: &Tz,
    today: NaiveDate,
) -> u32 {
    let days: BTreeSet<NaiveDate> = tasks
        .iter()
        .filter(|t| t.completed)
        .filter_map(|t| t.completed_at)
        .chain(sessions.iter().map(|s| s.completed_at))
        .filter_map(|ts| local_date(tz, ts))
        .collect();

    let mut newest_first = days.iter().rev();
    if newest_first.next() != Some(&today) {
        return 0;
    }
    let mut count = 1;
    let mut expected = today.pred_opt();
    for day in newest_first {
        if Some(*day) != expected {
            break;
        }
        count += 1;
        expected = day.pred_opt();
    }
    count
}

fn local_date<Tz: TimeZone>(tz: &Tz, ts: Timestamp) -> Option<NaiveDate> {
    tz.timestamp_millis_opt(ts).single().map(|dt| dt.date_naive())
}
