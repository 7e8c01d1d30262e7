//! Core domain layer for the Lookout address watcher.
//!
//! This crate contains the domain models, port traits (interfaces), and
//! business logic services for watching an Ethereum-style chain for
//! transactions that touch subscribed addresses. It follows hexagonal
//! architecture principles - this is the innermost layer with no
//! dependencies on infrastructure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     lookout (binary)                        │
//! ├──────────────────────────────┬──────────────────────────────┤
//! │         lookout-rpc          │        lookout-storage       │
//! │       (JSON-RPC client)      │      (in-memory stores)      │
//! ├──────────────────────────────┴──────────────────────────────┤
//! │                     lookout-core  ← YOU ARE HERE            │
//! │               (models, ports, services)                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`] - Domain models (Transaction, hex height helpers)
//! - [`ports`] - Interface traits for adapters to implement
//! - [`services`] - Core business logic (WatcherService)
//! - [`error`] - Domain error types
//! - [`metrics`] - Prometheus metrics definitions
//!
//! # Key Concepts
//!
//! ## Ports
//!
//! Ports define interfaces that external adapters must implement:
//!
//! - [`ports::ChainGateway`] - Fetch a block from a chain node
//! - [`ports::Stores`] - The address registry, block cursor and
//!   transaction ledger behind one injection point
//!
//! ## Ingestion Lifecycle
//!
//! 1. Resolve the target range: observed chain head down to the cursor
//! 2. Walk the range ascending, one block fetch per height
//! 3. Record transactions touching subscribed addresses into the ledger
//! 4. Advance the cursor only after a block is fully recorded
//! 5. Abort the whole pass on any failure; the next pass resumes at the
//!    cursor

pub mod error;
pub mod metrics;
pub mod models;
pub mod ports;
pub mod services;
