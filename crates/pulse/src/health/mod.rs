//! Per-target health history and up/down transitions.

pub mod record;
pub mod store;

pub use record::{HISTORY_CAPACITY, HealthRecord, HistoryEntry};
pub use store::{HealthStore, Transition};
