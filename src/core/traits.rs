use std::sync::Arc;

use async_trait::async_trait;
use ethers::providers::Middleware;
use ethers::types::{Address, Signature};

use crate::config::NetworkConfig;
use crate::models::SignerKind;
use crate::utils::Result;

/// A connected signer: the client transactions go through and the account behind it
#[derive(Debug)]
pub struct SignerSession<M> {
    pub client: Arc<M>,
    pub account: Address,
    pub chain_id: u64,
}

impl<M> Clone for SignerSession<M> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            account: self.account,
            chain_id: self.chain_id,
        }
    }
}

/// Core abstraction: anything that can hand the gateway a signing client
#[async_trait]
pub trait SignerProvider: Send + Sync {
    /// Middleware stack contract calls are sent through
    type Client: Middleware + 'static;

    fn kind(&self) -> SignerKind;

    /// Obtain account access on the configured chain
    async fn connect(&self, network: &NetworkConfig) -> Result<SignerSession<Self::Client>>;

    /// Sign a plain-text message with the session account (EIP-191)
    async fn sign_message(
        &self,
        session: &SignerSession<Self::Client>,
        message: &str,
    ) -> Result<Signature>;
}
