use ethers::prelude::*;
use crate::config::chain_name;
use crate::utils::{Result, GatewayError};

/// Plain HTTP JSON-RPC connection with its chain id resolved
#[derive(Debug, Clone)]
pub struct BlockchainClient {
    provider: Provider<Http>,
    chain_id: u64,
}

impl BlockchainClient {
    /// Connect and read the chain id
    pub async fn new(rpc_url: &str) -> Result<Self> {
        let provider = http_provider(rpc_url)?;

        let chain_id = provider.get_chainid().await?;

        tracing::info!("Connected to {} (chain ID {})", chain_name(chain_id.as_u64()), chain_id);

        Ok(Self {
            provider,
            chain_id: chain_id.as_u64(),
        })
    }

    pub fn provider(&self) -> &Provider<Http> {
        &self.provider
    }

    pub fn into_provider(self) -> Provider<Http> {
        self.provider
    }

    /// Native balance in wei
    pub async fn balance(&self, address: Address) -> Result<U256> {
        let balance = self.provider.get_balance(address, None).await?;
        Ok(balance)
    }

    pub async fn block_number(&self) -> Result<u64> {
        let block = self.provider.get_block_number().await?;
        Ok(block.as_u64())
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn chain_name(&self) -> &'static str {
        chain_name(self.chain_id)
    }
}

/// Build an HTTP provider without touching the network
pub fn http_provider(rpc_url: &str) -> Result<Provider<Http>> {
    Provider::<Http>::try_from(rpc_url).map_err(|e| {
        GatewayError::RpcError(ProviderError::CustomError(format!("Invalid RPC URL {}: {}", rpc_url, e)))
    })
}
