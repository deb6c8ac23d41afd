use tracing::debug;

use crate::error::Result;
use crate::models::TimerSession;
use crate::storage::{Store, SESSIONS_KEY};

/// Append-only log of completed timer intervals.
pub struct SessionLog {
    store: Store,
    sessions: Vec<TimerSession>,
}

impl SessionLog {
    pub fn open(store: Store) -> Self {
        let sessions = store.load_sessions();
        Self { store, sessions }
    }

    /// Records a session and writes the log through.
    pub fn append(&mut self, session: TimerSession) -> Result<()> {
        debug!(task = %session.task_name, duration = session.duration, "session logged");
        self.sessions.push(session);
        self.store.save(SESSIONS_KEY, &self.sessions)
    }

    /// All sessions in the order they were logged.
    pub fn all(&self) -> &[TimerSession] {
        &self.sessions
    }
}
