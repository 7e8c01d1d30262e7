//! Error types for the watcher domain layer.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`DomainError`] - Business logic errors
//! - [`StorageError`] - Store/repository errors
//! - [`ChainError`] - Chain node RPC errors
//! - [`WatcherError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Domain Errors
// =============================================================================

/// Business logic and domain rule violations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A block height string was not a valid `0x`-prefixed hex integer.
    #[error("Invalid block height: {0:?}")]
    InvalidHeight(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Store and repository errors.
///
/// The in-memory stores can only fail on a poisoned lock; other storage
/// engines plugging into the same ports would add their own variants.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A store lock was poisoned by a panicking writer.
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

// =============================================================================
// Chain Errors
// =============================================================================

/// Chain node RPC and connectivity errors.
///
/// All variants are fatal to an in-progress ingestion pass; none is
/// retried inside the core. The external scheduler's next invocation is
/// the retry.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Node unreachable, request failed, or non-success HTTP status.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body did not decode into the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The node returned a populated JSON-RPC error envelope.
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message from the node.
        message: String,
    },
}

// =============================================================================
// Watcher Errors
// =============================================================================

/// Top-level orchestration errors.
///
/// This is the main error type returned by [`crate::services::WatcherService`].
#[derive(Debug, Error)]
pub enum WatcherError {
    /// Domain logic error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Store error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A block fetch failed; `block` names the height or tag requested.
    #[error("Fetching block {block}: {source}")]
    BlockFetch {
        /// Height or tag that was being fetched.
        block: String,
        /// Underlying chain error.
        #[source]
        source: ChainError,
    },

    /// Graceful shutdown was requested mid-pass.
    ///
    /// This is not really an error but uses the error type for control flow.
    #[error("Watcher shutdown requested")]
    ShutdownRequested,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for watcher operations.
pub type WatcherResult<T> = Result<T, WatcherError>;

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;
