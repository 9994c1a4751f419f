//! Key-value persistence behind every store.
//!
//! Each collection is written whole under one key as a JSON document, and
//! read back once at startup. Backends only have to move strings around.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::AppError;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Document keys.
pub mod keys {
    pub const DIRECTORY: &str = "directory";
    pub const UID_MARKS: &str = "uid_marks";
    pub const QUESTIONS: &str = "questions";
    pub const POPUPS: &str = "popups";
    pub const IDENTITY: &str = "identity";
    pub const PROFILE: &str = "profile";
    pub const THEME: &str = "theme";
}

/// String-keyed storage contract. Writes overwrite the previous value.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: String) -> Result<(), AppError>;
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}

/// Reads and decodes a JSON document. `None` when the key was never written.
pub async fn load_json<T: DeserializeOwned>(
    kv: &dyn KvStore,
    key: &str,
) -> Result<Option<T>, AppError> {
    match kv.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub async fn save_json<T: Serialize + ?Sized>(
    kv: &dyn KvStore,
    key: &str,
    value: &T,
) -> Result<(), AppError> {
    let raw = serde_json::to_string(value)?;
    tracing::debug!(key, bytes = raw.len(), "persisting document");
    kv.set(key, raw).await
}
