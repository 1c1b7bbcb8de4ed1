/// Monitoring module - probing and cycle scheduling
///
/// This module is responsible for:
/// - Executing HTTP checks against targets
/// - Running probe cycles with a per-target spacing floor
pub mod checker;
pub mod scheduler;
pub mod types;

pub use checker::{Checker, HttpChecker};
pub use scheduler::MonitoringScheduler;
pub use types::{Outcome, ProbeReport, Target, TargetKind, TargetStatus};
