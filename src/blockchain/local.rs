//! Private-key signer for local development nodes

use std::sync::Arc;

use async_trait::async_trait;
use ethers::prelude::*;

use super::client::BlockchainClient;
use crate::config::NetworkConfig;
use crate::core::{SignerProvider, SignerSession};
use crate::models::SignerKind;
use crate::utils::{GatewayError, Result};

/// Signs with a fixed key held in memory. Never point this at a real network.
#[derive(Debug, Clone)]
pub struct LocalKeySigner {
    wallet: LocalWallet,
}

impl LocalKeySigner {
    pub fn new(private_key: &str) -> Result<Self> {
        let wallet: LocalWallet = private_key
            .trim()
            .parse()
            .map_err(|e: WalletError| GatewayError::WalletError(format!("Invalid private key: {}", e)))?;
        Ok(Self { wallet })
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }
}

#[async_trait]
impl SignerProvider for LocalKeySigner {
    type Client = SignerMiddleware<Provider<Http>, LocalWallet>;

    fn kind(&self) -> SignerKind {
        SignerKind::LocalKey
    }

    async fn connect(&self, network: &NetworkConfig) -> Result<SignerSession<Self::Client>> {
        tracing::warn!("No wallet available; signing with the development key for {:?}", self.address());

        let client = BlockchainClient::new(&network.rpc_url).await?;
        if client.chain_id() != network.chain_id {
            return Err(GatewayError::NetworkMismatch(format!(
                "RPC endpoint serves chain {}, expected {}",
                client.chain_id(),
                network.chain_id
            )));
        }

        let chain_id = client.chain_id();
        let wallet = self.wallet.clone().with_chain_id(chain_id);
        let account = wallet.address();
        let middleware = SignerMiddleware::new(client.into_provider(), wallet);

        Ok(SignerSession {
            client: Arc::new(middleware),
            account,
            chain_id,
        })
    }

    async fn sign_message(
        &self,
        _session: &SignerSession<Self::Client>,
        message: &str,
    ) -> Result<Signature> {
        self.wallet
            .sign_message(message)
            .await
            .map_err(|e| GatewayError::WalletError(e.to_string()))
    }
}
