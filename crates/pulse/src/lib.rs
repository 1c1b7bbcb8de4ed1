//! Pulse: periodic HTTP endpoint monitoring with deduplicated alerts.
//!
//! A cycle probes every registered [`Target`](monitoring::Target), applies the
//! outcomes to the [`HealthStore`](health::HealthStore), lets the
//! [`AlertEngine`](alerts::AlertEngine) decide on notifications, persists the
//! state document and refreshes the live summary. The [`Engine`] owns all of
//! it and also serves the `status` command surface.

pub mod alerts;
pub mod commands;
pub mod engine;
pub mod error;
pub mod health;
pub mod monitoring;
pub mod notifier;
pub mod persistence;
pub mod presenter;
pub mod registry;
pub mod validation;

pub use engine::{CycleReport, Engine, EngineSettings};
