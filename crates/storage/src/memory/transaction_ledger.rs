//! In-memory per-address transaction queues.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::{debug, trace};

use lookout_core::error::{StorageError, StorageResult};
use lookout_core::models::Transaction;
use lookout_core::ports::TransactionLedger;

/// In-memory implementation of [`TransactionLedger`].
///
/// One coarse lock guards the whole address→queue mapping; operations
/// are O(queue length) and queues stay small between drains.
#[derive(Default)]
pub struct MemTransactionLedger {
    queues: RwLock<HashMap<String, Vec<Transaction>>>,
}

impl MemTransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionLedger for MemTransactionLedger {
    async fn record_unique(&self, address: &str, tx: Transaction) -> StorageResult<bool> {
        let mut queues = self
            .queues
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;

        // Check-and-append under one lock hold so concurrent writers
        // cannot both pass the hash check.
        let queue = queues.entry(address.to_string()).or_default();
        if queue.iter().any(|queued| queued.hash == tx.hash) {
            trace!(address, hash = %tx.hash, "Duplicate hash, not recorded");
            return Ok(false);
        }

        queue.push(tx);
        Ok(true)
    }

    async fn contains(&self, address: &str, hash: &str) -> StorageResult<bool> {
        let queues = self
            .queues
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;

        Ok(queues
            .get(address)
            .is_some_and(|queue| queue.iter().any(|queued| queued.hash == hash)))
    }

    async fn drain(&self, address: &str) -> StorageResult<Vec<Transaction>> {
        let mut queues = self
            .queues
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;

        let drained = queues.remove(address).unwrap_or_default();
        debug!(address, count = drained.len(), "Queue drained");
        Ok(drained)
    }
}
