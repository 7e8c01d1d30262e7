mod chain_gateway;
mod stores;

pub use chain_gateway::*;
pub use stores::*;
