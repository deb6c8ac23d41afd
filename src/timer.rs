//! Countdown and Pomodoro timer.
//!
//! The timer is driven from outside: the caller invokes [`Timer::tick`] once
//! per second while it runs. When an interval ends the timer stops itself,
//! so further ticks are no-ops until it is started again.

use std::fmt;

use crate::config::{Config, PomodoroConfig};
use crate::models::{TimerSession, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// A single countdown of the given length in minutes.
    Custom { minutes: u64 },
    Pomodoro,
}

/// Phase of the Pomodoro cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PomodoroPhase {
    Focus,
    ShortBreak,
    LongBreak,
}

impl fmt::Display for PomodoroPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PomodoroPhase::Focus => "Focus",
            PomodoroPhase::ShortBreak => "Short Break",
            PomodoroPhase::LongBreak => "Long Break",
        })
    }
}

/// What happened when an interval ran out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerEvent {
    /// Session to log, present only for completed focus or custom intervals.
    pub session: Option<TimerSession>,
    /// Message for the user.
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Timer {
    mode: TimerMode,
    pomodoro: PomodoroConfig,
    phase: PomodoroPhase,
    /// Focus intervals finished in the current cycle.
    cycle: u32,
    seconds_left: u64,
    running: bool,
    task_name: String,
}

impl Timer {
    pub fn new(mode: TimerMode, pomodoro: PomodoroConfig) -> Self {
        let mut timer = Self {
            mode,
            pomodoro,
            phase: PomodoroPhase::Focus,
            cycle: 0,
            seconds_left: 0,
            running: false,
            task_name: String::new(),
        };
        timer.seconds_left = timer.interval_seconds();
        timer
    }

    /// A custom countdown using the configured defaults.
    pub fn from_config(config: &Config) -> Self {
        Self::new(TimerMode::Custom { minutes: config.custom_minutes.max(1) }, config.pomodoro)
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn phase(&self) -> PomodoroPhase {
        self.phase
    }

    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    pub fn cycles_per_round(&self) -> u32 {
        self.pomodoro.cycles_before_long_break
    }

    pub fn seconds_left(&self) -> u64 {
        self.seconds_left
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn set_task_name(&mut self, name: impl Into<String>) {
        self.task_name = name.into();
    }

    /// Length of the current interval in minutes.
    pub fn interval_minutes(&self) -> u64 {
        match self.mode {
            TimerMode::Custom { minutes } => minutes,
            TimerMode::Pomodoro => match self.phase {
                PomodoroPhase::Focus => self.pomodoro.focus_minutes,
                PomodoroPhase::ShortBreak => self.pomodoro.short_break_minutes,
                PomodoroPhase::LongBreak => self.pomodoro.long_break_minutes,
            },
        }
    }

    pub fn interval_seconds(&self) -> u64 {
        self.interval_minutes() * 60
    }

    pub fn start(&mut self) {
        if self.seconds_left == 0 {
            self.seconds_left = self.interval_seconds();
        }
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn toggle_running(&mut self) {
        if self.running {
            self.pause();
        } else {
            self.start();
        }
    }

    /// Stops and reloads the current interval. With `reset_cycle` a Pomodoro
    /// timer also returns to the first focus interval.
    pub fn reset(&mut self, reset_cycle: bool) {
        self.running = false;
        if reset_cycle {
            self.phase = PomodoroPhase::Focus;
            self.cycle = 0;
        }
        self.seconds_left = self.interval_seconds();
    }

    /// Switches mode, resetting the timer.
    pub fn set_mode(&mut self, mode: TimerMode) {
        self.mode = match mode {
            TimerMode::Custom { minutes } => TimerMode::Custom { minutes: minutes.max(1) },
            TimerMode::Pomodoro => TimerMode::Pomodoro,
        };
        self.reset(true);
    }

    /// Changes the custom countdown length, clamped to at least one minute.
    /// Has no effect in Pomodoro mode.
    pub fn set_custom_minutes(&mut self, minutes: u64) {
        if let TimerMode::Custom { .. } = self.mode {
            self.set_mode(TimerMode::Custom { minutes });
        }
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self, now: Timestamp) -> Option<TimerEvent> {
        if !self.running {
            return None;
        }
        if self.seconds_left > 1 {
            self.seconds_left -= 1;
            return None;
        }
        self.running = false;
        Some(self.finish(now))
    }

    fn finish(&mut self, now: Timestamp) -> TimerEvent {
        let duration = self.interval_seconds();
        match self.mode {
            TimerMode::Custom { .. } => {
                let label = if self.task_name.trim().is_empty() {
                    None
                } else {
                    Some(self.task_name.trim().to_string())
                };
                self.seconds_left = duration;
                TimerEvent {
                    message: format!("Time's up for: {}!", label.as_deref().unwrap_or("your task")),
                    session: Some(TimerSession {
                        task_name: label.unwrap_or_else(|| "Unnamed Task".to_string()),
                        duration,
                        completed_at: now,
                    }),
                }
            }
            TimerMode::Pomodoro => {
                let finished = self.phase;
                let event = match finished {
                    PomodoroPhase::Focus => {
                        self.cycle += 1;
                        let message = if self.cycle >= self.pomodoro.cycles_before_long_break {
                            self.cycle = 0;
                            self.phase = PomodoroPhase::LongBreak;
                            format!(
                                "{} Focus sessions complete! Time for a long break.",
                                self.pomodoro.cycles_before_long_break
                            )
                        } else {
                            self.phase = PomodoroPhase::ShortBreak;
                            "Focus session complete! Time for a short break.".to_string()
                        };
                        TimerEvent {
                            message,
                            session: Some(TimerSession {
                                task_name: format!("Pomodoro: {finished}"),
                                duration,
                                completed_at: now,
                            }),
                        }
                    }
                    PomodoroPhase::ShortBreak | PomodoroPhase::LongBreak => {
                        self.phase = PomodoroPhase::Focus;
                        TimerEvent { message: "Break's over! Time to focus.".to_string(), session: None }
                    }
                };
                self.seconds_left = self.interval_seconds();
                event
            }
        }
    }

    /// Remaining time as `MM:SS`.
    pub fn formatted_remaining(&self) -> String {
        format!("{:02}:{:02}", self.seconds_left / 60, self.seconds_left % 60)
    }

    /// Fraction of the current interval already elapsed.
    pub fn progress(&self) -> f64 {
        let total = self.interval_seconds();
        if total == 0 {
            return 0.0;
        }
        (total.saturating_sub(self.seconds_left)) as f64 / total as f64
    }
}
