use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

use crate::types::FlowKind;
use crate::utils::lock;

/// One immutable line of the user-facing activity log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Position in the log, starting at 0
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    /// Flow that produced the entry; `None` for session events
    pub flow: Option<FlowKind>,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%H:%M:%S%.3f"), self.message)
    }
}

/// Append-only activity log shared between the session manager and the
/// session notification handlers.
///
/// Cloning yields another handle on the same log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        // Entries are only ever pushed whole, so a poisoned log is still consistent.
        lock(&self.entries)
    }

    pub fn append(&self, flow: Option<FlowKind>, message: impl Into<String>) -> LogEntry {
        let message = message.into();
        let mut entries = self.lock();
        let entry = LogEntry {
            sequence: entries.len() as u64,
            timestamp: Utc::now(),
            flow,
            message,
        };
        info!(
            sequence = entry.sequence,
            flow = ?entry.flow,
            "{}",
            entry.message
        );
        entries.push(entry.clone());
        entry
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of all entries in append order
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Messages only, in append order
    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(|e| e.message.clone()).collect()
    }
}
