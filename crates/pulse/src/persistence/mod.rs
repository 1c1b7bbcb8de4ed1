/// Persistence boundary
///
/// The core never touches files directly: whole documents are loaded and saved
/// through a [`DocumentStore`]. Three documents exist:
/// - `sites`: targets, the summary message handle and a creation timestamp
/// - `state`: health records and open alert records
/// - `admins`: the admin registry
pub mod documents;
pub mod file;
pub mod memory;

pub use documents::{ADMINS_DOCUMENT, AdminsDocument, SITES_DOCUMENT, STATE_DOCUMENT, SitesDocument, StateDocument};
pub use file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::PersistenceError;

/// Key-value store of named JSON documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load a document, `None` if it was never saved.
    async fn load(&self, name: &str) -> Result<Option<Value>, PersistenceError>;

    /// Replace a document as a whole.
    async fn save(&self, name: &str, document: &Value) -> Result<(), PersistenceError>;
}

/// Load and deserialize a document.
pub async fn load<D: DeserializeOwned>(
    store: &dyn DocumentStore,
    name: &str,
) -> Result<Option<D>, PersistenceError> {
    match store.load(name).await? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| PersistenceError::Serialization { document: name.to_string(), source }),
        None => Ok(None),
    }
}

/// Serialize and save a document.
pub async fn save<D: Serialize>(
    store: &dyn DocumentStore,
    name: &str,
    document: &D,
) -> Result<(), PersistenceError> {
    let value = serde_json::to_value(document)
        .map_err(|source| PersistenceError::Serialization { document: name.to_string(), source })?;
    store.save(name, &value).await
}

/// Load a document, writing `seed()` first if it does not exist yet.
pub async fn load_or_seed<D, F>(store: &dyn DocumentStore, name: &str, seed: F) -> Result<D, PersistenceError>
where
    D: Serialize + DeserializeOwned,
    F: FnOnce() -> D,
{
    if let Some(document) = load(store, name).await? {
        return Ok(document);
    }

    tracing::info!(document = name, "Seeding missing document with defaults");
    let document = seed();
    save(store, name, &document).await?;
    Ok(document)
}
