use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;

use super::DocumentStore;
use crate::error::PersistenceError;

/// Stores each document as `<dir>/<name>.json`
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn load(&self, name: &str) -> Result<Option<Value>, PersistenceError> {
        let raw = match fs::read_to_string(self.path_for(name)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(PersistenceError::Io { document: name.to_string(), source }),
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| PersistenceError::Serialization { document: name.to_string(), source })
    }

    async fn save(&self, name: &str, document: &Value) -> Result<(), PersistenceError> {
        let io_error = |source| PersistenceError::Io { document: name.to_string(), source };

        let raw = serde_json::to_string_pretty(document)
            .map_err(|source| PersistenceError::Serialization { document: name.to_string(), source })?;

        fs::create_dir_all(&self.dir).await.map_err(io_error)?;

        // Write then rename so a crash never leaves a truncated document.
        let path = self.path_for(name);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, raw).await.map_err(io_error)?;
        fs::rename(&tmp, &path).await.map_err(io_error)
    }
}
