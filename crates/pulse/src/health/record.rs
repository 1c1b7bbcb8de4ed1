use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::monitoring::types::{Outcome, TargetStatus};

/// Number of history entries kept per target.
pub const HISTORY_CAPACITY: usize = 300;

/// One applied probe outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub ok: bool,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub latency_ms: Option<u64>,
}

impl HistoryEntry {
    pub fn new(timestamp: DateTime<Utc>, outcome: &Outcome) -> Self {
        Self {
            timestamp,
            ok: outcome.ok,
            status_code: outcome.status_code,
            latency_ms: outcome.latency_ms,
        }
    }
}

/// Health state of one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthRecord {
    /// First time the target was seen up. Sticky: later successes keep it.
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub last_up: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub last_down: Option<DateTime<Utc>>,
    /// `last_down` of the failure that opened the current downtime episode.
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub down_since: Option<DateTime<Utc>>,
    pub consecutive_fails: u32,
    pub last_status: TargetStatus,
    pub history: VecDeque<HistoryEntry>,
}

impl HealthRecord {
    /// Append to history, evicting the oldest entries beyond capacity.
    pub fn push_history(&mut self, entry: HistoryEntry) {
        self.history.push_back(entry);
        while self.history.len() > HISTORY_CAPACITY {
            self.history.pop_front();
        }
    }

    /// The last `count` entries, oldest first.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter().skip(self.history.len().saturating_sub(count))
    }
}
