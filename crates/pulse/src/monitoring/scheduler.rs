use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use super::checker::Checker;
use super::types::{ProbeReport, Target};

/// Minimum spacing between two probes of the same target.
pub const DEFAULT_MIN_PROBE_INTERVAL: Duration = Duration::from_millis(3000);

/// Runs probe cycles over the registered targets
///
/// Tracks when each target was last probed so that a cycle arriving too soon
/// after the previous one skips it, whatever the configured cycle period.
pub struct MonitoringScheduler {
    min_interval: Duration,
    last_probed: Mutex<HashMap<String, Instant>>,
}

impl MonitoringScheduler {
    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval, last_probed: Mutex::new(HashMap::new()) }
    }

    /// Claim a probe slot for `target_id`, returning false while it is still
    /// within the minimum interval.
    fn claim(&self, target_id: &str) -> bool {
        let now = Instant::now();
        let mut last_probed = match self.last_probed.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(previous) = last_probed.get(target_id) {
            if now.duration_since(*previous) < self.min_interval {
                return false;
            }
        }
        last_probed.insert(target_id.to_string(), now);
        true
    }

    /// Forget a target so a later target with the same id starts fresh.
    pub fn forget(&self, target_id: &str) {
        if let Ok(mut last_probed) = self.last_probed.lock() {
            last_probed.remove(target_id);
        }
    }

    /// Probe every target not throttled by the minimum interval.
    ///
    /// A probe error is logged and that target left out of the returned
    /// reports; the remaining targets are still probed.
    pub async fn run_cycle(&self, targets: &[Target], checker: &dyn Checker) -> Vec<ProbeReport> {
        let mut reports = Vec::with_capacity(targets.len());

        for target in targets {
            if !self.claim(&target.id) {
                debug!(site = %target.id, "Skipping probe, minimum interval not elapsed");
                continue;
            }

            match checker.check(target).await {
                Ok(outcome) => reports.push(ProbeReport { target: target.clone(), outcome }),
                Err(e) => warn!(site = %target.id, error = %e, "Probe failed, excluded from cycle"),
            }
        }

        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::monitoring::types::Outcome;

    struct FixedChecker;

    #[async_trait::async_trait]
    impl Checker for FixedChecker {
        async fn check(&self, target: &Target) -> Result<Outcome, ProbeError> {
            if target.id == "broken" {
                return Err(ProbeError::Client("boom".into()));
            }
            Ok(Outcome::up(200, 5))
        }
    }

    fn targets() -> Vec<Target> {
        vec![
            Target::http("a", "A", "http://a.test"),
            Target::http("broken", "Broken", "http://b.test"),
            Target::http("c", "C", "http://c.test"),
        ]
    }

    #[tokio::test]
    async fn test_probe_error_does_not_abort_cycle() {
        let scheduler = MonitoringScheduler::new(Duration::ZERO);

        let reports = scheduler.run_cycle(&targets(), &FixedChecker).await;

        let ids: Vec<_> = reports.iter().map(|r| r.target.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_min_interval_skips_recent_targets() {
        let scheduler = MonitoringScheduler::new(Duration::from_millis(3000));
        let targets = vec![Target::http("a", "A", "http://a.test")];

        assert_eq!(scheduler.run_cycle(&targets, &FixedChecker).await.len(), 1);
        assert!(scheduler.run_cycle(&targets, &FixedChecker).await.is_empty());

        tokio::time::advance(Duration::from_millis(2999)).await;
        assert!(scheduler.run_cycle(&targets, &FixedChecker).await.is_empty());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(scheduler.run_cycle(&targets, &FixedChecker).await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forget_resets_throttle() {
        let scheduler = MonitoringScheduler::new(Duration::from_secs(60));
        let targets = vec![Target::http("a", "A", "http://a.test")];

        scheduler.run_cycle(&targets, &FixedChecker).await;
        scheduler.forget("a");

        assert_eq!(scheduler.run_cycle(&targets, &FixedChecker).await.len(), 1);
    }
}
