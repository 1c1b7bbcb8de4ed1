//! Alert firing with one notification per downtime episode.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::health::Transition;
use crate::monitoring::types::Target;

/// Present while a notified downtime episode is still open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    /// Key of the episode the notification was sent for.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_notified_at: DateTime<Utc>,
}

/// Alert to hand to the notifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertNotice {
    pub target: Target,
    pub consecutive_fails: u32,
    pub down_since: DateTime<Utc>,
}

/// What the engine decided for one applied outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertAction {
    None,
    Fire(AlertNotice),
    /// The target recovered while an alert record was open.
    Resolved,
}

/// Alert records keyed by target id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertEngine {
    records: BTreeMap<String, AlertRecord>,
}

impl AlertEngine {
    pub fn get(&self, target_id: &str) -> Option<&AlertRecord> {
        self.records.get(target_id)
    }

    pub fn remove(&mut self, target_id: &str) -> Option<AlertRecord> {
        self.records.remove(target_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Decide on the alert for `target` after its latest transition.
    ///
    /// Recovery always drops the record. A failure fires when the threshold is
    /// reached and no notification was recorded for this episode yet. With
    /// `suppressed` set (maintenance) nothing fires and no record is written,
    /// so an episode still open afterwards alerts on its next failure.
    pub fn evaluate(&mut self, target: &Target, transition: Transition, suppressed: bool) -> AlertAction {
        match transition {
            Transition::Up => match self.records.remove(&target.id) {
                Some(_) => AlertAction::Resolved,
                None => AlertAction::None,
            },
            Transition::Down { threshold_reached: false, .. } => AlertAction::None,
            Transition::Down { consecutive_fails, episode, .. } => {
                let already_notified = self
                    .records
                    .get(&target.id)
                    .is_some_and(|record| record.last_notified_at == episode);
                if already_notified || suppressed {
                    return AlertAction::None;
                }

                self.records.insert(target.id.clone(), AlertRecord { last_notified_at: episode });
                AlertAction::Fire(AlertNotice {
                    target: target.clone(),
                    consecutive_fails,
                    down_since: episode,
                })
            }
        }
    }
}
