//! Task list, focus timer and statistics engine behind the `zenith` dashboard.
//!
//! State lives in a [`storage::Store`] as three independent JSON values:
//! the task collection, the timer session log and the tag registry.

pub mod commands;
pub mod config;
pub mod error;
pub mod migrate;
pub mod models;
pub mod quotes;
pub mod repository;
pub mod sessions;
pub mod stats;
pub mod storage;
pub mod timer;
pub mod tui;
pub mod view;

pub use error::{Error, Result};
