//! Persistence seam for player records.
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::ledger::{PlayerId, PlayerRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("commit rejected: {0}")]
    Rejected(String),
}

/// Datastore holding one [`PlayerRecord`] per player.
///
/// Implementations must make `commit` all-or-nothing across every record in
/// the batch; a failed commit leaves the last successful state visible.
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load the current record of a player.
    ///
    /// # Errors
    ///
    /// Returns an error if the datastore cannot be read.
    async fn load(&self, id: PlayerId) -> Result<Option<PlayerRecord>, StoreError>;

    /// Persist a batch of records atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch cannot be written; nothing is written then.
    async fn commit(&self, records: &[PlayerRecord]) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    async fn load(&self, id: PlayerId) -> Result<Option<PlayerRecord>, StoreError> {
        (**self).load(id).await
    }

    async fn commit(&self, records: &[PlayerRecord]) -> Result<(), StoreError> {
        (**self).commit(records).await
    }
}

/// In-process store backed by a hash map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<PlayerId, PlayerRecord>>>,
    commit_delay: Option<Duration>,
    fail_next_commit: Arc<AtomicBool>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep inside every commit before the write lands.
    #[must_use]
    pub fn with_commit_delay(mut self, delay: Duration) -> Self {
        self.commit_delay = Some(delay);
        self
    }

    /// Make the next commit fail with [`StoreError::Rejected`].
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Snapshot of every stored id, sorted.
    pub async fn ids(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self.records.read().await.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

#[async_trait::async_trait]
impl LedgerStore for MemoryStore {
    async fn load(&self, id: PlayerId) -> Result<Option<PlayerRecord>, StoreError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn commit(&self, records: &[PlayerRecord]) -> Result<(), StoreError> {
        if let Some(delay) = self.commit_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Rejected("injected failure".to_string()));
        }
        let mut guard = self.records.write().await;
        for record in records {
            guard.insert(record.id, record.clone());
        }
        Ok(())
    }
}
