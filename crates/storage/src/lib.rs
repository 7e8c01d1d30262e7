//! Storage layer for the Lookout address watcher.
//!
//! This crate provides in-memory implementations of the store traits
//! defined in `lookout-core`. State is volatile: a restart forgets the
//! subscription set, the cursor, and any queued transactions. The store
//! contracts are engine-agnostic, so a durable backend can replace this
//! crate without touching the domain layer.
//!
//! # Architecture
//!
//! - [`memory::MemAddressRegistry`] - subscription set
//! - [`memory::MemCursorStore`] - last fully-ingested height
//! - [`memory::MemTransactionLedger`] - per-address transaction queues
//! - [`memory::MemStores`] - composite implementing the `Stores` trait
//!
//! # Usage
//!
//! ```ignore
//! use lookout_storage::MemStores;
//!
//! let stores = Arc::new(MemStores::new());
//! ```

pub mod memory;

pub use memory::{MemAddressRegistry, MemCursorStore, MemStores, MemTransactionLedger};
