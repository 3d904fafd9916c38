//! Chains the wallet may need to be switched to or told about

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

pub const MAINNET: u64 = 1;
pub const SEPOLIA: u64 = 11_155_111;
pub const HARDHAT: u64 = 31_337;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeCurrency {
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
}

/// Parameters for `wallet_addEthereumChain`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    pub chain_id: String,
    pub chain_name: &'static str,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<&'static str>,
    pub block_explorer_urls: Vec<&'static str>,
}

static KNOWN_CHAINS: Lazy<HashMap<u64, AddChainParams>> = Lazy::new(|| {
    let mut chains = HashMap::new();
    chains.insert(
        SEPOLIA,
        AddChainParams {
            chain_id: chain_id_hex(SEPOLIA),
            chain_name: "Sepolia",
            native_currency: NativeCurrency {
                name: "ETH",
                symbol: "ETH",
                decimals: 18,
            },
            rpc_urls: vec!["https://ethereum-sepolia-rpc.publicnode.com"],
            block_explorer_urls: vec!["https://sepolia.etherscan.io"],
        },
    );
    chains
});

/// Chain id in the `0x`-prefixed form wallets expect
pub fn chain_id_hex(chain_id: u64) -> String {
    format!("0x{:x}", chain_id)
}

/// Parameters to add `chain_id` to a wallet, if we know how
pub fn add_chain_params(chain_id: u64) -> Option<&'static AddChainParams> {
    KNOWN_CHAINS.get(&chain_id)
}

pub fn chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        MAINNET => "Ethereum Mainnet",
        SEPOLIA => "Sepolia Testnet",
        HARDHAT => "Hardhat Local",
        _ => "Unknown Chain",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_hex() {
        assert_eq!(chain_id_hex(SEPOLIA), "0xaa36a7");
        assert_eq!(chain_id_hex(HARDHAT), "0x7a69");
    }

    #[test]
    fn test_only_sepolia_can_be_added() {
        let params = add_chain_params(SEPOLIA).expect("sepolia params");
        let json = serde_json::to_value(params).unwrap();
        assert_eq!(json["chainId"], "0xaa36a7");
        assert_eq!(json["nativeCurrency"]["decimals"], 18);
        assert!(add_chain_params(HARDHAT).is_none());
    }

    #[test]
    fn test_chain_names() {
        assert_eq!(chain_name(SEPOLIA), "Sepolia Testnet");
        assert_eq!(chain_name(5), "Unknown Chain");
    }
}
