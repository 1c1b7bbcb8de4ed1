use std::env::var;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init() {
    initialize_tracing(LevelFilter::INFO, None);
}

/// Same as [`init`], additionally appending plain-text log lines to `path`.
///
/// The file is created (with its parent directory) if missing. If it cannot be
/// opened, logging continues on stdout only and a warning is emitted.
pub fn init_with_log_file(path: &Path) {
    initialize_tracing(LevelFilter::INFO, Some(path));
}

fn env_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::builder().with_default_directive(level.into()).from_env_lossy()
}

/// Initialize tracing subscriber with default configuration.
fn initialize_tracing(level: LevelFilter, log_file: Option<&Path>) {
    let log_format = var("RUST_LOG_FORMAT")
        .inspect_err(|error| {
            warn!("Failed to read RUST_LOG_FORMAT, falling back to default: {error}")
        })
        .unwrap_or_default();

    let log_layer = match log_format.as_str() {
        "json" => tracing_subscriber::fmt::layer().json().with_filter(env_filter(level)).boxed(),
        _ => tracing_subscriber::fmt::layer()
            .compact()
            .without_time()
            .with_filter(env_filter(level))
            .boxed(),
    };

    let mut open_error = None;
    let file_layer = log_file.and_then(|path| match open_append(path) {
        Ok(file) => Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(env_filter(level))
                .boxed(),
        ),
        Err(error) => {
            open_error = Some((path.display().to_string(), error));
            None
        }
    });

    tracing_subscriber::registry().with(log_layer).with(file_layer).init();

    if let Some((path, error)) = open_error {
        warn!(%path, "Failed to open log file, logging to stdout only: {error}");
    }
}

fn open_append(path: &Path) -> std::io::Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
