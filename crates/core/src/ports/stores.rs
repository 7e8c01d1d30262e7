//! Port traits for the watcher's stores.
//!
//! These traits define the storage interface used by the domain layer.
//! Implementations live in the infrastructure layer (e.g.,
//! `lookout-storage`). The contracts are storage-engine-agnostic; the
//! reference implementation is in-memory.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::models::Transaction;

// =============================================================================
// Store Traits
// =============================================================================

/// Owns the set of subscribed addresses.
#[async_trait]
pub trait AddressRegistry: Send + Sync {
    /// Add `address` to the subscription set if absent.
    ///
    /// Returns `true` when newly added, `false` when it was already
    /// subscribed - an idempotence signal, not an error.
    async fn subscribe(&self, address: &str) -> StorageResult<bool>;

    /// Membership test; pure query, no side effect.
    async fn is_subscribed(&self, address: &str) -> StorageResult<bool>;
}

/// Owns the height of the last block whose transactions are fully recorded.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// The last fully-ingested height, or `None` if nothing has been
    /// ingested yet. `Some(0)` is a legitimate genesis height and is
    /// never conflated with "not set".
    async fn current_height(&self) -> StorageResult<Option<u64>>;

    /// Unconditional overwrite. The ingestion service is the sole writer
    /// and upholds monotonicity; the store does not reject lower values.
    async fn set_current_height(&self, height: u64) -> StorageResult<()>;
}

/// Owns, per address, the queue of recorded-but-not-yet-drained
/// transactions.
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    /// Append `tx` to `address`'s queue unless a queued entry already
    /// carries the same hash. Returns whether it was recorded.
    ///
    /// Dedup is scoped per address and only covers entries still queued:
    /// once drained, history of a hash is lost, and re-ingesting the same
    /// block would re-insert the transaction. The ledger provides
    /// at-most-one-pending-copy semantics, not permanent hash history.
    async fn record_unique(&self, address: &str, tx: Transaction) -> StorageResult<bool>;

    /// Whether `address`'s queue currently holds a transaction with this
    /// hash.
    async fn contains(&self, address: &str, hash: &str) -> StorageResult<bool>;

    /// Atomically take `address`'s queue and reset it to empty.
    ///
    /// Destructive: an immediate second call yields an empty sequence.
    /// An address with nothing queued yields an empty sequence, not an
    /// error.
    async fn drain(&self, address: &str) -> StorageResult<Vec<Transaction>>;
}

// =============================================================================
// Composite Stores
// =============================================================================

/// Combined store access for the watcher service.
///
/// Each store guards its own state independently; no lock spans all
/// three.
pub trait Stores: Send + Sync {
    /// Access the address registry.
    fn addresses(&self) -> &dyn AddressRegistry;

    /// Access the block cursor store.
    fn cursor(&self) -> &dyn CursorStore;

    /// Access the transaction ledger.
    fn ledger(&self) -> &dyn TransactionLedger;
}
