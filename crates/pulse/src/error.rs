use thiserror::Error;

/// A probe that could not run at all (as opposed to a target being down)
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Probe client error: {0}")]
    Client(String),
}

/// Failure reading or writing a persisted document
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on document '{document}': {source}")]
    Io {
        document: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed document '{document}': {source}")]
    Serialization {
        document: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure delivering a message through the notifier
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    MalformedResponse(String),
}

/// Errors surfaced to the user invoking a command
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("You are not an admin.")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Unknown subcommand: {0}")]
    UnknownCommand(String),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
