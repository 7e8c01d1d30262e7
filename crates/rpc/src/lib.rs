//! Ethereum JSON-RPC adapter for the Lookout address watcher.
//!
//! This crate implements the [`ChainGateway`] port from `lookout-core`
//! over HTTP JSON-RPC, using `eth_getBlockByNumber` with full transaction
//! objects.
//!
//! # Usage
//!
//! ```ignore
//! use lookout_rpc::{EthereumRpcClient, RpcClientConfig};
//!
//! let client = EthereumRpcClient::new(RpcClientConfig::default())?;
//! let head = client.fetch_block(BlockRef::Latest).await?;
//! ```
//!
//! [`ChainGateway`]: lookout_core::ports::ChainGateway

mod client;
mod wire;

pub use client::{EthereumRpcClient, RpcClientConfig, DEFAULT_RPC_URL};
