//! Target and admin registries.

pub mod admins;
pub mod targets;

pub use admins::AdminRegistry;
pub use targets::{TargetRegistry, slugify};
