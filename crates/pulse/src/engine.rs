//! Process-root context owning all monitoring state.
//!
//! The engine holds one coarse lock per persisted document. Locks are never
//! held across probes, persistence or notifier calls, so periodic cycles and
//! command handlers interleave freely at those suspension points.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, warn};

use crate::alerts::{AlertAction, AlertNotice, AlertRecord};
use crate::error::PersistenceError;
use crate::health::HealthRecord;
use crate::monitoring::scheduler::DEFAULT_MIN_PROBE_INTERVAL;
use crate::monitoring::{Checker, MonitoringScheduler, Target};
use crate::notifier::Notifier;
use crate::persistence::{
    self, ADMINS_DOCUMENT, AdminsDocument, DocumentStore, SITES_DOCUMENT, STATE_DOCUMENT, SitesDocument,
    StateDocument,
};
use crate::presenter::{self, Snapshot};
use crate::registry::AdminRegistry;

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(5000);
pub const MIN_CHECK_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAIN_ADMIN: &str = "1163301364009541764";

/// Tunables for an [`Engine`]
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Period of the monitoring cycle.
    pub check_interval: Duration,
    /// Minimum spacing between probes of one target.
    pub min_probe_interval: Duration,
    /// Delay before the first cycle after startup.
    pub initial_delay: Duration,
    /// Delay before the extra cycle following `status add`.
    pub add_refresh_delay: Duration,
    /// Identity seeded as the protected admin.
    pub main_admin: String,
    /// Prefix of free-text commands.
    pub command_prefix: String,
    /// File the `logs` command reads from.
    pub log_file: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            check_interval: DEFAULT_CHECK_INTERVAL,
            min_probe_interval: DEFAULT_MIN_PROBE_INTERVAL,
            initial_delay: Duration::from_millis(500),
            add_refresh_delay: Duration::from_secs(1),
            main_admin: DEFAULT_MAIN_ADMIN.to_string(),
            command_prefix: "!".to_string(),
            log_file: None,
        }
    }
}

/// Counts from one monitoring cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub probed: usize,
    pub alerts: usize,
    pub recovered: usize,
}

/// Full dump used by `status backup`
#[derive(Serialize)]
struct Backup<'a> {
    config: &'a SitesDocument,
    state: &'a StateDocument,
    admins: &'a AdminsDocument,
}

pub struct Engine {
    pub(crate) settings: EngineSettings,
    pub(crate) store: Arc<dyn DocumentStore>,
    pub(crate) checker: Arc<dyn Checker>,
    notifier: Arc<dyn Notifier>,
    pub(crate) scheduler: MonitoringScheduler,
    pub(crate) sites: Mutex<SitesDocument>,
    pub(crate) state: Mutex<StateDocument>,
    pub(crate) admins: Mutex<AdminRegistry>,
    maintenance: AtomicBool,
    interval: watch::Sender<Duration>,
    pub(crate) started_at: Instant,
}

/// Current time truncated to the millisecond precision documents store.
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

impl Engine {
    /// Load (or seed) every document and build the engine.
    ///
    /// Unreadable documents are logged and replaced by defaults in memory.
    pub async fn load(
        settings: EngineSettings,
        store: Arc<dyn DocumentStore>,
        checker: Arc<dyn Checker>,
        notifier: Arc<dyn Notifier>,
    ) -> Arc<Self> {
        let main_admin = settings.main_admin.clone();

        let (mut sites, sites_loaded) =
            load_or_default(store.as_ref(), SITES_DOCUMENT, SitesDocument::seed).await;
        let (mut state, state_loaded) =
            load_or_default(store.as_ref(), STATE_DOCUMENT, StateDocument::default).await;
        let (mut admins, admins_loaded) =
            load_or_default(store.as_ref(), ADMINS_DOCUMENT, || AdminRegistry::new(main_admin)).await;

        // Unreadable documents are left on disk untouched.
        let sites_changed = sites.sites.normalize_ids() && sites_loaded;
        let state_changed = state.cover(sites.sites.list()) && state_loaded;
        let admins_changed = admins.repair() && admins_loaded;

        info!(
            targets = sites.sites.list().len(),
            records = state.sites.len(),
            admins = admins.admins().len(),
            "Loaded monitoring documents"
        );

        let (interval, _) = watch::channel(settings.check_interval);
        let engine = Arc::new(Self {
            scheduler: MonitoringScheduler::new(settings.min_probe_interval),
            settings,
            store,
            checker,
            notifier,
            sites: Mutex::new(sites),
            state: Mutex::new(state),
            admins: Mutex::new(admins),
            maintenance: AtomicBool::new(false),
            interval,
            started_at: Instant::now(),
        });

        if sites_changed {
            engine.persist_sites().await;
        }
        if state_changed {
            engine.persist_state().await;
        }
        if admins_changed {
            engine.persist_admins().await;
        }
        engine
    }

    pub fn check_interval(&self) -> Duration {
        *self.interval.borrow()
    }

    /// Change the cycle period of the running monitor loop.
    pub fn set_check_interval(&self, period: Duration) {
        self.interval.send_replace(period);
    }

    pub fn is_maintenance(&self) -> bool {
        self.maintenance.load(Ordering::SeqCst)
    }

    pub fn set_maintenance(&self, on: bool) {
        self.maintenance.store(on, Ordering::SeqCst);
    }

    pub fn command_prefix(&self) -> &str {
        &self.settings.command_prefix
    }

    pub async fn targets(&self) -> Vec<Target> {
        self.sites.lock().await.sites.list().to_vec()
    }

    pub async fn health(&self, target_id: &str) -> Option<HealthRecord> {
        self.state.lock().await.sites.get(target_id).cloned()
    }

    pub async fn alert(&self, target_id: &str) -> Option<AlertRecord> {
        self.state.lock().await.alerts.get(target_id).copied()
    }

    pub async fn message_id(&self) -> Option<String> {
        self.sites.lock().await.message_id.clone()
    }

    pub async fn is_admin(&self, identity: &str) -> bool {
        self.admins.lock().await.is_admin(identity)
    }

    /// Render the current state of every target.
    pub async fn snapshot(&self) -> Snapshot {
        let sites = self.sites.lock().await;
        let state = self.state.lock().await;
        presenter::render(
            sites.sites.list(),
            &state.sites,
            now_millis(),
            self.check_interval(),
            self.is_maintenance(),
        )
    }

    /// Probe, apply outcomes, fire alerts, persist, then refresh the summary.
    pub async fn run_cycle(&self) -> CycleReport {
        let targets = self.targets().await;
        let reports = self.scheduler.run_cycle(&targets, self.checker.as_ref()).await;

        let now = now_millis();
        let suppressed = self.is_maintenance();

        let mut report = CycleReport::default();
        let mut fired: Vec<AlertNotice> = Vec::new();
        {
            // Held with state while applying: a removal must not interleave.
            let sites = self.sites.lock().await;
            let mut state = self.state.lock().await;
            let StateDocument { sites: health, alerts } = &mut *state;

            // Targets removed while probes were in flight are dropped.
            for probe in reports.iter().filter(|p| sites.sites.get(&p.target.id).is_some()) {
                report.probed += 1;
                let transition =
                    health.apply(&probe.target.id, &probe.outcome, probe.target.alert_threshold(), now);

                match alerts.evaluate(&probe.target, transition, suppressed) {
                    AlertAction::Fire(notice) => fired.push(notice),
                    AlertAction::Resolved => {
                        report.recovered += 1;
                        info!(site = %probe.target.id, "Target recovered");
                    }
                    AlertAction::None => {}
                }
            }
        }

        self.persist_state().await;

        for notice in &fired {
            warn!(site = %notice.target.id, fails = notice.consecutive_fails, "Target is down, alerting");
            if let Err(e) = self.notifier.post_alert(notice).await {
                error!(site = %notice.target.id, error = %e, "Failed to post alert");
            }
        }
        report.alerts = fired.len();

        self.publish_summary().await;
        debug!(probed = report.probed, alerts = report.alerts, "Monitoring cycle complete");
        report
    }

    /// Edit the summary message in place, posting a new one when that fails.
    pub async fn publish_summary(&self) {
        let snapshot = self.snapshot().await;

        if let Some(handle) = self.message_id().await {
            match self.notifier.edit_summary(&handle, &snapshot).await {
                Ok(()) => return,
                Err(e) => warn!(message = %handle, error = %e, "Editing summary failed, posting a new one"),
            }
        }

        match self.notifier.send_summary(&snapshot).await {
            Ok(handle) => {
                info!(message = %handle, "Posted summary message");
                self.sites.lock().await.message_id = Some(handle);
                self.persist_sites().await;
            }
            Err(e) => error!(error = %e, "Failed to post summary"),
        }
    }

    /// Run the periodic monitor loop until the process exits.
    ///
    /// The first cycle fires after `initial_delay`; later cycles follow the
    /// current check interval, which may change while running.
    pub fn spawn_monitor(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let engine = Arc::clone(self);

        tokio::spawn(async move {
            let mut period_rx = engine.interval.subscribe();
            tokio::time::sleep(engine.settings.initial_delay).await;
            engine.run_cycle().await;

            let mut timer = ticker(*period_rx.borrow_and_update());
            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        engine.run_cycle().await;
                    }
                    changed = period_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let period = *period_rx.borrow_and_update();
                        info!(interval_ms = period.as_millis() as u64, "Check interval changed");
                        timer = ticker(period);
                    }
                }
            }
        })
    }

    /// Re-read sites and state from the store, dropping unsaved changes.
    pub async fn reload(&self) -> Result<(), PersistenceError> {
        let sites: Option<SitesDocument> = persistence::load(self.store.as_ref(), SITES_DOCUMENT).await?;
        let state: Option<StateDocument> = persistence::load(self.store.as_ref(), STATE_DOCUMENT).await?;

        let mut current_sites = self.sites.lock().await;
        let mut current_state = self.state.lock().await;
        if let Some(sites) = sites {
            *current_sites = sites;
        }
        if let Some(state) = state {
            *current_state = state;
        }
        let sites_changed = current_sites.sites.normalize_ids();
        let state_changed = current_state.cover(current_sites.sites.list());
        info!(targets = current_sites.sites.list().len(), "Reloaded documents");
        drop(current_state);
        drop(current_sites);

        if sites_changed {
            self.persist_sites().await;
        }
        if state_changed {
            self.persist_state().await;
        }
        Ok(())
    }

    pub(crate) async fn backup_json(&self) -> Result<String, serde_json::Error> {
        let sites = self.sites.lock().await;
        let state = self.state.lock().await;
        let admins = self.admins.lock().await;
        serde_json::to_string_pretty(&Backup { config: &sites, state: &state, admins: &admins })
    }

    pub(crate) async fn export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&*self.sites.lock().await)
    }

    pub(crate) async fn persist_sites(&self) -> bool {
        let document = self.sites.lock().await.clone();
        self.persist(SITES_DOCUMENT, &document).await
    }

    pub(crate) async fn persist_state(&self) -> bool {
        let document = self.state.lock().await.clone();
        self.persist(STATE_DOCUMENT, &document).await
    }

    pub(crate) async fn persist_admins(&self) -> bool {
        let document = self.admins.lock().await.clone();
        self.persist(ADMINS_DOCUMENT, &document).await
    }

    /// Save a document, logging failures. In-memory state stays authoritative.
    async fn persist<D: Serialize + Sync>(&self, name: &str, document: &D) -> bool {
        match persistence::save(self.store.as_ref(), name, document).await {
            Ok(()) => true,
            Err(e) => {
                error!(document = name, error = %e, "Failed to persist document");
                false
            }
        }
    }
}

fn ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Load or seed a document. The flag is false when defaults had to stand in
/// for a document that could not be read.
async fn load_or_default<D, F>(store: &dyn DocumentStore, name: &str, seed: F) -> (D, bool)
where
    D: Serialize + serde::de::DeserializeOwned,
    F: FnOnce() -> D + Clone,
{
    match persistence::load_or_seed(store, name, seed.clone()).await {
        Ok(document) => (document, true),
        Err(e) => {
            error!(document = name, error = %e, "Failed to load document, using defaults");
            (seed(), false)
        }
    }
}
