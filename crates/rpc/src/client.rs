//! HTTP JSON-RPC client implementing the ChainGateway port.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use lookout_core::error::{ChainError, ChainResult};
use lookout_core::ports::{BlockRef, ChainGateway, RawBlock};

use crate::wire::{JsonRpcRequest, JsonRpcResponse};

/// Public Ethereum mainnet endpoint used when no URL is configured.
pub const DEFAULT_RPC_URL: &str = "https://ethereum-rpc.publicnode.com";

const METHOD_GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";

/// Configuration for the JSON-RPC client.
#[derive(Debug, Clone)]
pub struct RpcClientConfig {
    /// Node endpoint URL.
    pub url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for RpcClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_RPC_URL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// JSON-RPC client adapter implementing the [`ChainGateway`] port.
pub struct EthereumRpcClient {
    http: reqwest::Client,
    url: String,
    id_counter: AtomicU64,
}

impl EthereumRpcClient {
    /// Create a client for the configured endpoint.
    pub fn new(config: RpcClientConfig) -> ChainResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            url: config.url,
            id_counter: AtomicU64::new(0),
        })
    }

    async fn send(&self, request: &JsonRpcRequest) -> ChainResult<Value> {
        let start = Instant::now();
        debug!(method = %request.method, id = request.id, "Sending request to node");

        let response = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ChainError::Transport(format!(
                "HTTP {}",
                response.status().as_u16()
            )));
        }

        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))?;

        let result = body.into_result().map_err(|e| ChainError::Rpc {
            code: e.code,
            message: e.message,
        })?;

        debug!(duration_ms = start.elapsed().as_millis() as u64, "Request done");
        Ok(result)
    }
}

#[async_trait]
impl ChainGateway for EthereumRpcClient {
    #[instrument(skip(self), fields(block = %block))]
    async fn fetch_block(&self, block: BlockRef) -> ChainResult<RawBlock> {
        let id = self.id_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let request = JsonRpcRequest::new(
            id,
            METHOD_GET_BLOCK_BY_NUMBER,
            // `true` asks for full transaction objects, not just hashes
            vec![Value::String(block.to_string()), Value::Bool(true)],
        );

        let result = self.send(&request).await?;
        if result.is_null() {
            // The walk range never exceeds the observed head, so a
            // missing block is a protocol violation rather than a skip.
            return Err(ChainError::InvalidResponse(format!(
                "node returned no block for {block}"
            )));
        }

        serde_json::from_value(result).map_err(|e| ChainError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_result_deserializes_into_raw_block() {
        let json = serde_json::json!({
            "number": "0x2",
            "hash": "0xfeed",
            "transactions": [
                {"hash": "0x1", "from": "0xa1", "to": "0xa2", "value": "0x10"},
                {"hash": "0x2", "from": "0xa2", "value": "0x0"}
            ]
        });

        let block: RawBlock = serde_json::from_value(json).unwrap();
        assert_eq!(block.number, "0x2");
        assert_eq!(block.transactions.len(), 2);
        assert_eq!(block.transactions[0].to.as_deref(), Some("0xa2"));
        // Contract creation: `to` absent on the wire
        assert_eq!(block.transactions[1].to, None);
    }

    #[test]
    fn empty_block_deserializes_without_transactions_field() {
        let json = serde_json::json!({ "number": "0x0" });
        let block: RawBlock = serde_json::from_value(json).unwrap();
        assert!(block.transactions.is_empty());
    }

    #[test]
    fn explicit_null_recipient_maps_to_none() {
        let json = serde_json::json!(
            {"hash": "0x1", "from": "0xa1", "to": null, "value": "0x0"}
        );
        let tx: lookout_core::ports::RawTransaction = serde_json::from_value(json).unwrap();
        assert_eq!(tx.to, None);
    }
}
