//! In-memory storage adapter.
//!
//! Each store guards its own state with its own lock; no lock spans all
//! three. Critical sections are cheap and non-suspending, so plain
//! `std::sync` locks are used behind the async port signatures.

mod address_registry;
mod cursor_store;
mod transaction_ledger;

pub use address_registry::MemAddressRegistry;
pub use cursor_store::MemCursorStore;
pub use transaction_ledger::MemTransactionLedger;

use lookout_core::ports::{AddressRegistry, CursorStore, Stores, TransactionLedger};

// =============================================================================
// Composite Stores
// =============================================================================

/// Aggregated in-memory stores implementing the `Stores` trait.
#[derive(Default)]
pub struct MemStores {
    addresses: MemAddressRegistry,
    cursor: MemCursorStore,
    ledger: MemTransactionLedger,
}

impl MemStores {
    /// Create an empty store aggregate.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Stores for MemStores {
    fn addresses(&self) -> &dyn AddressRegistry {
        &self.addresses
    }

    fn cursor(&self) -> &dyn CursorStore {
        &self.cursor
    }

    fn ledger(&self) -> &dyn TransactionLedger {
        &self.ledger
    }
}
