//! Browser-style wallet reached over JSON-RPC
//!
//! Speaks the EIP-1193 methods a wallet extension exposes: account access,
//! chain switching and `personal_sign`. Transactions are sent with the
//! wallet account as sender and signed by the wallet itself.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::utils::{format_ether, hex, to_checksum};
use serde_json::{json, Value};

use super::client::{http_provider, BlockchainClient};
use crate::config::{add_chain_params, chain_id_hex, chain_name, NetworkConfig};
use crate::core::{SignerProvider, SignerSession};
use crate::models::SignerKind;
use crate::utils::errors::{is_user_rejection, rpc_error_code, UNKNOWN_CHAIN_CODES};
use crate::utils::{GatewayError, Result};

#[derive(Debug, Clone)]
pub struct InjectedWallet {
    wallet_url: String,
}

impl InjectedWallet {
    pub fn new(wallet_url: impl Into<String>) -> Self {
        Self {
            wallet_url: wallet_url.into(),
        }
    }

    /// Check that a wallet answers at `wallet_url`
    pub async fn probe(wallet_url: &str) -> Result<Self> {
        let provider = http_provider(wallet_url)?;
        let accounts: Vec<Address> = provider.request("eth_accounts", ()).await?;
        tracing::debug!("Wallet at {} exposes {} account(s)", wallet_url, accounts.len());
        Ok(Self::new(wallet_url))
    }

    pub fn wallet_url(&self) -> &str {
        &self.wallet_url
    }

    async fn request_account(&self, provider: &Provider<Http>) -> Result<Address> {
        let accounts: Vec<Address> = provider
            .request("eth_requestAccounts", ())
            .await
            .map_err(GatewayError::from_wallet)?;

        accounts
            .first()
            .copied()
            .ok_or_else(|| GatewayError::WalletError("wallet returned no accounts".to_string()))
    }

    async fn log_balance(&self, client: &BlockchainClient, account: Address, minimum: U256) {
        match client.balance(account).await {
            Ok(balance) => {
                tracing::info!("Account {} balance: {} ETH", to_checksum(&account, None), format_ether(balance));
                if balance < minimum {
                    tracing::warn!("Balance is low; transactions may fail to pay for gas");
                }
            }
            Err(e) => tracing::warn!("Could not read account balance: {}", e),
        }
    }
}

/// Move the wallet to the configured chain if it is on `current`, then
/// confirm the switch took effect
pub(crate) async fn ensure_chain<P: JsonRpcClient>(
    provider: &Provider<P>,
    current: u64,
    network: &NetworkConfig,
) -> Result<u64> {
    if current == network.chain_id {
        return Ok(current);
    }

    tracing::info!("Wallet is on chain {}, need {}", current, network.chain_name());
    switch_network(provider, network.chain_id).await?;
    tokio::time::sleep(network.network_switch_delay).await;

    let current = provider.get_chainid().await?.as_u64();
    if current != network.chain_id {
        return Err(GatewayError::NetworkMismatch(format!(
            "wallet still on chain {} after switching to {}",
            current, network.chain_id
        )));
    }
    Ok(current)
}

/// Ask the wallet to move to `chain_id`, registering the chain first if it
/// doesn't know it and we have its parameters
pub(crate) async fn switch_network<P: JsonRpcClient>(provider: &Provider<P>, chain_id: u64) -> Result<()> {
    let name = chain_name(chain_id);
    tracing::info!("Switching wallet to {} ({})", name, chain_id);

    let switch = provider
        .request::<_, Value>(
            "wallet_switchEthereumChain",
            [json!({ "chainId": chain_id_hex(chain_id) })],
        )
        .await;

    let err = match switch {
        Ok(_) => return Ok(()),
        Err(err) => err,
    };

    if is_user_rejection(&err) {
        return Err(GatewayError::UserRejected(format!("network switch to {}", name)));
    }

    let unknown_chain = rpc_error_code(&err)
        .map(|code| UNKNOWN_CHAIN_CODES.contains(&code))
        .unwrap_or(false);
    if !unknown_chain {
        return Err(GatewayError::NetworkMismatch(format!(
            "could not switch to {}: {}",
            name, err
        )));
    }

    let params = add_chain_params(chain_id).ok_or_else(|| {
        GatewayError::NetworkMismatch(format!(
            "wallet does not know chain {}; switch to it manually",
            chain_id
        ))
    })?;

    provider
        .request::<_, Value>("wallet_addEthereumChain", [params])
        .await
        .map_err(|e| {
            if is_user_rejection(&e) {
                GatewayError::UserRejected(format!("adding network {}", params.chain_name))
            } else {
                GatewayError::NetworkMismatch(format!(
                    "could not add {}; add it in the wallet manually: {}",
                    params.chain_name, e
                ))
            }
        })?;

    Ok(())
}

#[async_trait]
impl SignerProvider for InjectedWallet {
    type Client = Provider<Http>;

    fn kind(&self) -> SignerKind {
        SignerKind::InjectedWallet
    }

    async fn connect(&self, network: &NetworkConfig) -> Result<SignerSession<Self::Client>> {
        let provider = http_provider(&self.wallet_url)?;
        let account = self.request_account(&provider).await?;

        let client = BlockchainClient::new(&self.wallet_url).await?;
        let chain_id = ensure_chain(client.provider(), client.chain_id(), network).await?;

        self.log_balance(&client, account, network.min_balance).await;

        let provider = client.into_provider().with_sender(account);

        Ok(SignerSession {
            client: Arc::new(provider),
            account,
            chain_id,
        })
    }

    async fn sign_message(
        &self,
        session: &SignerSession<Self::Client>,
        message: &str,
    ) -> Result<Signature> {
        let payload = format!("0x{}", hex::encode(message.as_bytes()));
        let raw: Bytes = session
            .client
            .request("personal_sign", (payload, session.account))
            .await
            .map_err(GatewayError::from_wallet)?;

        let signature = Signature::try_from(raw.as_ref())
            .map_err(|e| GatewayError::WalletError(format!("malformed signature: {}", e)))?;

        signature
            .verify(message, session.account)
            .map_err(|_| GatewayError::WalletError("signature does not match account".to_string()))?;

        Ok(signature)
    }
}
