//! Tracing setup shared by the pulse binaries.

mod subscriber;

pub use subscriber::{init, init_with_log_file};
