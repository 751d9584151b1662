//! Shared outcome log feeding the dashboard.
//!
//! One lock covers both the entry list and the counters so a snapshot
//! never shows counters that disagree with the entries.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::events::{BenchEvent, EventBus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Info,
    Success,
    Skipped,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Local wall-clock time, `HH:MM:SS`.
    pub time: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// Running counters. `total` counts every entry ever recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    #[serde(rename = "totalVotes")]
    pub total: u64,
    #[serde(rename = "totalSuccess")]
    pub success: u64,
    #[serde(rename = "totalSkipped")]
    pub skipped: u64,
    #[serde(rename = "totalErrors")]
    pub errors: u64,
}

/// Counters plus the newest entries, taken under one lock.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub totals: Totals,
    pub logs: Vec<LogEntry>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: VecDeque<LogEntry>,
    totals: Totals,
}

/// Newest-first log with bounded retention.
pub struct Ledger {
    inner: Mutex<Inner>,
    capacity: usize,
    bus: Option<EventBus>,
}

impl Ledger {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: capacity.max(1),
            bus: None,
        }
    }

    /// Forward every recorded entry to `bus`.
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Append an entry and bump the matching counter.
    pub fn record(&self, kind: EntryKind, message: impl Into<String>) {
        let entry = LogEntry {
            time: Local::now().format("%H:%M:%S").to_string(),
            message: message.into(),
            kind,
        };

        match kind {
            EntryKind::Error => tracing::warn!("{}", entry.message),
            _ => tracing::info!("{}", entry.message),
        }

        {
            let mut inner = self.lock();
            inner.totals.total += 1;
            match kind {
                EntryKind::Success => inner.totals.success += 1,
                EntryKind::Skipped => inner.totals.skipped += 1,
                EntryKind::Error => inner.totals.errors += 1,
                EntryKind::Info => {}
            }
            inner.entries.push_front(entry.clone());
            inner.entries.truncate(self.capacity);
        }

        if let Some(bus) = &self.bus {
            bus.emit(BenchEvent::Logged { entry });
        }
    }

    pub fn totals(&self) -> Totals {
        self.lock().totals
    }

    /// Counters and up to `limit` newest entries.
    pub fn snapshot(&self, limit: usize) -> Snapshot {
        let inner = self.lock();
        Snapshot {
            totals: inner.totals,
            logs: inner.entries.iter().take(limit).cloned().collect(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
