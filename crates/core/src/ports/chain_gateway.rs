//! Port trait for the chain-node block fetch collaborator.
//!
//! This trait defines the single operation the watcher needs from a
//! chain node: fetch a block (header plus transaction list) by height or
//! by the symbolic "latest" tag. Implementations live in the
//! infrastructure layer (e.g., `lookout-rpc`).

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ChainResult;
use crate::models::height;

/// Block selector: a concrete height or the node's view of the chain head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRef {
    /// The highest block the node knows at call time. This resolution is
    /// a snapshot and may advance between two calls.
    Latest,
    /// A concrete block height.
    Number(u64),
}

impl std::fmt::Display for BlockRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Number(n) => write!(f, "{}", height::format_hex(*n)),
        }
    }
}

/// Block data as returned by the node before domain transformation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBlock {
    /// Hex-encoded block height.
    pub number: String,
    /// Full transaction objects, in the order the node returned them.
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
}

/// Transaction data as returned by the node.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTransaction {
    /// Transaction hash.
    pub hash: String,
    /// Sender address.
    pub from: String,
    /// Recipient address; absent for contract creation.
    #[serde(default)]
    pub to: Option<String>,
    /// Transferred value (hex-encoded wei).
    pub value: String,
}

/// Port trait for the chain-node block source.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Fetch a block with its full transaction list.
    ///
    /// Every failure mode - transport, undecodable response, or an error
    /// envelope from the node - is fatal to the caller's current pass.
    async fn fetch_block(&self, block: BlockRef) -> ChainResult<RawBlock>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_ref_wire_format() {
        assert_eq!(BlockRef::Latest.to_string(), "latest");
        assert_eq!(BlockRef::Number(0).to_string(), "0x0");
        assert_eq!(BlockRef::Number(6_443_195).to_string(), "0x624fbb");
    }
}
