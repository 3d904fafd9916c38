use crate::config::NetworkConfig;
use crate::utils::Result;

use super::injected::InjectedWallet;
use super::local::LocalKeySigner;

/// Signer picked by probing what the environment offers
#[derive(Debug, Clone)]
pub enum SignerChoice {
    Injected(InjectedWallet),
    Local(LocalKeySigner),
}

/// Prefer a wallet that answers at the configured URL, else the development key
pub async fn probe_signer(network: &NetworkConfig) -> Result<SignerChoice> {
    if let Some(url) = network.wallet_url.as_deref() {
        match InjectedWallet::probe(url).await {
            Ok(wallet) => {
                tracing::info!("Using wallet at {}", url);
                return Ok(SignerChoice::Injected(wallet));
            }
            Err(e) => tracing::warn!("No wallet reachable at {} ({}); using development key", url, e),
        }
    }

    Ok(SignerChoice::Local(LocalKeySigner::new(&network.dev_private_key)?))
}
