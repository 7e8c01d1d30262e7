//! In-memory subscription set.

use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use lookout_core::error::{StorageError, StorageResult};
use lookout_core::ports::AddressRegistry;

/// In-memory implementation of [`AddressRegistry`].
///
/// Addresses are opaque, case-sensitive strings; the set never holds the
/// same address twice.
#[derive(Default)]
pub struct MemAddressRegistry {
    addresses: RwLock<HashSet<String>>,
}

impl MemAddressRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AddressRegistry for MemAddressRegistry {
    async fn subscribe(&self, address: &str) -> StorageResult<bool> {
        let mut set = self
            .addresses
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;

        let added = set.insert(address.to_string());
        debug!(address, added, "Subscription recorded");
        Ok(added)
    }

    async fn is_subscribed(&self, address: &str) -> StorageResult<bool> {
        let set = self
            .addresses
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;

        Ok(set.contains(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribe_twice_is_idempotent() {
        let registry = MemAddressRegistry::new();

        assert!(registry.subscribe("0xabc").await.unwrap());
        assert!(!registry.subscribe("0xabc").await.unwrap());
        assert!(registry.is_subscribed("0xabc").await.unwrap());
    }

    #[tokio::test]
    async fn membership_is_case_sensitive() {
        let registry = MemAddressRegistry::new();

        registry.subscribe("0xAbC").await.unwrap();
        assert!(registry.is_subscribed("0xAbC").await.unwrap());
        assert!(!registry.is_subscribed("0xabc").await.unwrap());
    }
}
