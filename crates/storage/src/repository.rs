use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// One flat key/value record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEntry {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Flat key/value contract for player progress.
///
/// Values are opaque strings; the services layer decides their encoding.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<ProgressEntry>, StorageError>;

    /// Insert or overwrite `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn put(&self, key: &str, value: &str, at: DateTime<Utc>) -> Result<(), StorageError>;

    /// List keys starting with `prefix`, sorted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Delete every key starting with `prefix`; returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove_prefix(&self, prefix: &str) -> Result<u64, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    entries: Arc<Mutex<BTreeMap<String, ProgressEntry>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get(&self, key: &str) -> Result<Option<ProgressEntry>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str, at: DateTime<Utc>) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(
            key.to_owned(),
            ProgressEntry {
                key: key.to_owned(),
                value: value.to_owned(),
                updated_at: at,
            },
        );
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn remove_prefix(&self, prefix: &str) -> Result<u64, StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let before = guard.len();
        guard.retain(|k, _| !k.starts_with(prefix));
        Ok(u64::try_from(before - guard.len()).unwrap_or(u64::MAX))
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(InMemoryRepository::new());
        Self { progress }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gefen_core::time::fixed_now;

    #[tokio::test]
    async fn put_overwrites_and_get_returns_latest() {
        let repo = InMemoryRepository::new();
        repo.put("gefen_game_quiz_best", "1", fixed_now()).await.unwrap();
        repo.put("gefen_game_quiz_best", "2", fixed_now()).await.unwrap();

        let entry = repo.get("gefen_game_quiz_best").await.unwrap().unwrap();
        assert_eq!(entry.value, "2");
        assert!(repo.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_prefix_leaves_foreign_keys() {
        let repo = InMemoryRepository::new();
        repo.put("gefen_game_a", "1", fixed_now()).await.unwrap();
        repo.put("gefen_game_b", "1", fixed_now()).await.unwrap();
        repo.put("other_app", "1", fixed_now()).await.unwrap();

        assert_eq!(repo.remove_prefix("gefen_game_").await.unwrap(), 2);
        assert_eq!(repo.keys("").await.unwrap(), vec!["other_app".to_owned()]);
    }
}
