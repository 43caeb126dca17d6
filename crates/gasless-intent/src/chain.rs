//! chain state needed to build a batch: chain id, head, account nonce

use crate::types::Address;
use crate::{Error, Result};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use async_trait::async_trait;
use std::fmt::Display;

#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn chain_id(&self) -> Result<u64>;

    /// current head block number
    async fn block_number(&self) -> Result<u64>;

    /// next nonce for `address`, pending transactions included
    async fn transaction_count(&self, address: &Address) -> Result<u64>;
}

/// ethereum json-rpc over http
#[derive(Clone)]
pub struct JsonRpcChain {
    provider: DynProvider,
}

impl JsonRpcChain {
    pub fn new(url: &str) -> Result<Self> {
        let url: reqwest::Url = url
            .parse()
            .map_err(|e| Error::InvalidData(format!("invalid rpc url {:?}: {}", url, e)))?;
        Ok(Self::from_provider(ProviderBuilder::new().connect_http(url).erased()))
    }

    pub fn from_provider(provider: DynProvider) -> Self {
        Self { provider }
    }
}

fn rpc_error(method: &str, e: impl Display) -> Error {
    Error::Rpc(format!("{} failed: {}", method, e))
}

#[async_trait]
impl ChainReader for JsonRpcChain {
    async fn chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| rpc_error("eth_chainId", e))
    }

    async fn block_number(&self) -> Result<u64> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| rpc_error("eth_blockNumber", e))
    }

    async fn transaction_count(&self, address: &Address) -> Result<u64> {
        self.provider
            .get_transaction_count(*address)
            .pending()
            .await
            .map_err(|e| rpc_error("eth_getTransactionCount", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_url() {
        assert!(matches!(JsonRpcChain::new("not a url"), Err(Error::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_rpc_error() {
        let chain = JsonRpcChain::new("http://127.0.0.1:1").unwrap();
        assert!(matches!(chain.block_number().await, Err(Error::Rpc(_))));
    }
}
