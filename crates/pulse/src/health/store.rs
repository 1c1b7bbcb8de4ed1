use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{HealthRecord, HistoryEntry};
use crate::monitoring::types::{Outcome, TargetStatus};

/// What applying an outcome did to a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The target is up. Any open alert for it must be cleared.
    Up,
    /// The target failed again.
    Down {
        consecutive_fails: u32,
        /// `consecutive_fails` has reached the target's alert threshold.
        threshold_reached: bool,
        /// Key of the downtime episode this failure belongs to.
        episode: DateTime<Utc>,
    },
}

/// Per-target health records, keyed by target id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HealthStore {
    records: BTreeMap<String, HealthRecord>,
}

impl HealthStore {
    pub fn get(&self, target_id: &str) -> Option<&HealthRecord> {
        self.records.get(target_id)
    }

    /// Create an empty record for `target_id` if none exists. Returns true if
    /// one was created.
    pub fn ensure(&mut self, target_id: &str) -> bool {
        if self.records.contains_key(target_id) {
            return false;
        }
        self.records.insert(target_id.to_string(), HealthRecord::default());
        true
    }

    pub fn remove(&mut self, target_id: &str) -> Option<HealthRecord> {
        self.records.remove(target_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Apply one probe outcome observed at `now`.
    pub fn apply(
        &mut self,
        target_id: &str,
        outcome: &Outcome,
        alert_after: u32,
        now: DateTime<Utc>,
    ) -> Transition {
        let record = self.records.entry(target_id.to_string()).or_default();
        record.push_history(HistoryEntry::new(now, outcome));

        if outcome.ok {
            record.last_up = record.last_up.or(Some(now));
            record.consecutive_fails = 0;
            record.down_since = None;
            record.last_status = TargetStatus::Up;
            Transition::Up
        } else {
            record.last_down = Some(now);
            record.consecutive_fails = record.consecutive_fails.saturating_add(1);
            record.last_status = TargetStatus::Down;
            let episode = *record.down_since.get_or_insert(now);
            Transition::Down {
                consecutive_fails: record.consecutive_fails,
                threshold_reached: record.consecutive_fails >= alert_after.max(1),
                episode,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::record::HISTORY_CAPACITY;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    fn fail() -> Outcome {
        Outcome::unreachable()
    }

    fn ok() -> Outcome {
        Outcome::up(200, 12)
    }

    #[test]
    fn test_apply_creates_record_lazily() {
        let mut store = HealthStore::default();
        assert!(store.get("a").is_none());

        store.apply("a", &ok(), 2, at(1));

        let record = store.get("a").unwrap();
        assert_eq!(record.history.len(), 1);
        assert_eq!(record.last_status, TargetStatus::Up);
    }

    #[test]
    fn test_history_is_bounded_fifo() {
        let mut store = HealthStore::default();
        for i in 0..(HISTORY_CAPACITY as i64 + 5) {
            store.apply("a", &ok(), 2, at(i));
        }

        let record = store.get("a").unwrap();
        assert_eq!(record.history.len(), HISTORY_CAPACITY);
        assert_eq!(record.history.front().unwrap().timestamp, at(5));
        assert_eq!(record.history.back().unwrap().timestamp, at(HISTORY_CAPACITY as i64 + 4));
    }

    #[test]
    fn test_last_up_is_sticky() {
        let mut store = HealthStore::default();
        store.apply("a", &ok(), 2, at(100));
        store.apply("a", &ok(), 2, at(200));
        assert_eq!(store.get("a").unwrap().last_up, Some(at(100)));

        store.apply("a", &fail(), 2, at(300));
        store.apply("a", &ok(), 2, at(400));
        assert_eq!(store.get("a").unwrap().last_up, Some(at(100)));
    }

    #[test]
    fn test_consecutive_fails_count_and_reset() {
        let mut store = HealthStore::default();

        for expected in 1..=3 {
            let transition = store.apply("a", &fail(), 2, at(expected as i64));
            match transition {
                Transition::Down { consecutive_fails, threshold_reached, .. } => {
                    assert_eq!(consecutive_fails, expected);
                    assert_eq!(threshold_reached, expected >= 2);
                }
                Transition::Up => panic!("expected a failure"),
            }
        }
        let record = store.get("a").unwrap();
        assert_eq!(record.last_down, Some(at(3)));
        assert_eq!(record.last_status, TargetStatus::Down);

        assert_eq!(store.apply("a", &ok(), 2, at(4)), Transition::Up);
        let record = store.get("a").unwrap();
        assert_eq!(record.consecutive_fails, 0);
        assert_eq!(record.down_since, None);
        assert_eq!(record.last_down, Some(at(3)));
    }

    #[test]
    fn test_episode_key_is_stable_until_recovery() {
        let mut store = HealthStore::default();
        let episode_of = |t: Transition| match t {
            Transition::Down { episode, .. } => episode,
            Transition::Up => panic!("expected a failure"),
        };

        assert_eq!(episode_of(store.apply("a", &fail(), 2, at(10))), at(10));
        assert_eq!(episode_of(store.apply("a", &fail(), 2, at(20))), at(10));
        store.apply("a", &ok(), 2, at(30));
        assert_eq!(episode_of(store.apply("a", &fail(), 2, at(40))), at(40));
    }

    #[test]
    fn test_rejected_response_counts_as_failure() {
        let mut store = HealthStore::default();
        store.apply("a", &Outcome::rejected(500, 30), 1, at(1));

        let record = store.get("a").unwrap();
        assert_eq!(record.last_status, TargetStatus::Down);
        assert_eq!(record.history[0].status_code, Some(500));
    }

    #[test]
    fn test_ensure_and_remove() {
        let mut store = HealthStore::default();
        assert!(store.ensure("a"));
        assert!(!store.ensure("a"));
        assert_eq!(store.len(), 1);
        assert!(store.remove("a").is_some());
        assert!(store.is_empty());
    }
}
