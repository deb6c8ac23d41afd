use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::migrate::{migrate_sessions, migrate_tasks};
use crate::models::{Task, TimerSession, Timestamp};

/// Key of the task collection.
pub const TASKS_KEY: &str = "tasks";
/// Key of the timer session log.
pub const SESSIONS_KEY: &str = "timerSessions";
/// Key of the tag registry.
pub const TAGS_KEY: &str = "allTags";

/// Raw string storage addressed by key.
pub trait Backend {
    /// Returns `None` when nothing is stored under `key`.
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Backend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(self.path(key))?;
        f.write_all(value.as_bytes())?;
        Ok(())
    }
}

/// Keeps values in memory. Clones of a [`Store`] built on it share the same map.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryBackend {
    /// Seeds a raw value, useful for feeding legacy or corrupt data.
    pub fn with_entry(self, key: &str, value: &str) -> Self {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        self
    }
}

impl Backend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Typed JSON view over a [`Backend`].
#[derive(Clone)]
pub struct Store {
    backend: Rc<dyn Backend>,
}

impl Store {
    pub fn new(backend: impl Backend + 'static) -> Self {
        Self { backend: Rc::new(backend) }
    }

    /// Opens a store over the JSON files in `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self::new(FileBackend::new(dir))
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::default())
    }

    /// Loads the value under `key`.
    ///
    /// Returns `default` when nothing is stored, and also when the stored data
    /// cannot be read or parsed, in which case a warning is logged.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.load_value(key) {
            Some(value) => match serde_json::from_value(value) {
                Ok(v) => v,
                Err(e) => {
                    warn!(key, error = %e, "stored value has an unexpected shape, using default");
                    default
                }
            },
            None => default,
        }
    }

    /// Serializes `value` and writes it under `key` immediately.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let s = serde_json::to_string_pretty(value)?;
        self.backend.write(key, &s)?;
        debug!(key, bytes = s.len(), "saved");
        Ok(())
    }

    /// Loads the task collection, repairing records of older shapes.
    ///
    /// `now` stands in for a missing task id.
    pub fn load_tasks(&self, now: Timestamp) -> Vec<Task> {
        self.load_records(TASKS_KEY, |value| migrate_tasks(value, now))
    }

    /// Loads the session log, dropping only the records that cannot be read.
    pub fn load_sessions(&self) -> Vec<TimerSession> {
        self.load_records(SESSIONS_KEY, migrate_sessions)
    }

    fn load_records<T>(&self, key: &str, decode: impl FnOnce(&serde_json::Value) -> Vec<T>) -> Vec<T> {
        match self.load_value(key) {
            Some(value) if value.is_array() => {
                let records = decode(&value);
                let dropped = value.as_array().map_or(0, Vec::len) - records.len();
                if dropped > 0 {
                    debug!(key, dropped, "skipped unreadable records");
                }
                records
            }
            Some(_) => {
                warn!(key, "stored value is not an array, starting empty");
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Raw stored text under `key`.
    pub fn raw(&self, key: &str) -> Result<Option<String>> {
        self.backend.read(key)
    }

    fn load_value(&self, key: &str) -> Option<serde_json::Value> {
        let s = match self.backend.read(key) {
            Ok(Some(s)) => s,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "failed to read stored value, using default");
                return None;
            }
        };
        match serde_json::from_str(&s) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(key, error = %e, "failed to parse stored value, using default");
                None
            }
        }
    }
}
