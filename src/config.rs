use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::stats::DEFAULT_WEEKLY_GOAL_MINUTES;

const CONFIG_FILE: &str = "config.toml";

/// Returns the directory holding the JSON data files and `config.toml`.
///
/// The path is determined in the following order:
/// 1. `ZENITH_DATA_DIR` environment variable.
/// 2. `~/.local/share/zenith` (on Linux).
/// 3. `./zenith-data` (fallback).
pub fn data_dir() -> PathBuf {
    std::env::var("ZENITH_DATA_DIR").map(PathBuf::from).unwrap_or_else(|_| {
        match dirs::data_local_dir() {
            Some(mut p) => {
                p.push("zenith");
                p
            }
            None => PathBuf::from("zenith-data"),
        }
    })
}

/// Dashboard settings loaded from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Focus minutes per week that count as 100%.
    pub weekly_goal_minutes: u64,
    /// Seconds between reminder scans in the dashboard.
    pub reminder_interval_secs: u64,
    /// Initial length of a custom countdown.
    pub custom_minutes: u64,
    pub pomodoro: PomodoroConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weekly_goal_minutes: DEFAULT_WEEKLY_GOAL_MINUTES,
            reminder_interval_secs: 10,
            custom_minutes: 30,
            pomodoro: PomodoroConfig::default(),
        }
    }
}

/// Interval lengths for the Pomodoro cycle.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PomodoroConfig {
    pub focus_minutes: u64,
    pub short_break_minutes: u64,
    pub long_break_minutes: u64,
    /// Focus sessions before a long break.
    pub cycles_before_long_break: u32,
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            focus_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            cycles_before_long_break: 4,
        }
    }
}

impl Config {
    /// Loads `config.toml` from `dir`, falling back to defaults when it is absent.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let checks = [
            ("weekly_goal_minutes", self.weekly_goal_minutes),
            ("reminder_interval_secs", self.reminder_interval_secs),
            ("custom_minutes", self.custom_minutes),
            ("pomodoro.focus_minutes", self.pomodoro.focus_minutes),
            ("pomodoro.short_break_minutes", self.pomodoro.short_break_minutes),
            ("pomodoro.long_break_minutes", self.pomodoro.long_break_minutes),
            (
                "pomodoro.cycles_before_long_break",
                u64::from(self.pomodoro.cycles_before_long_break),
            ),
        ];
        match checks.iter().find(|(_, value)| *value == 0) {
            Some((field, _)) => Err(Error::InvalidConfig(format!("{field} must be greater than zero"))),
            None => Ok(()),
        }
    }
}
