//! Deployment settings for the review contracts and companion backend

pub mod networks;

use std::str::FromStr;
use std::time::Duration;

use ethers::types::{Address, U256};

use crate::utils::{GatewayError, Result};

pub use networks::{add_chain_params, chain_id_hex, chain_name, AddChainParams, HARDHAT, SEPOLIA};

/// Hardhat's first default account. Development only.
pub const HARDHAT_DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// 0.001 ETH in wei, kept in reserve for gas before submitting a review
pub const MIN_SUBMIT_BALANCE_WEI: u64 = 1_000_000_000_000_000;

/// Tokens the contract pays a newly registered user
pub const REGISTRATION_REWARD: u64 = 100;

pub const ENV_PREFIX: &str = "SAFETY_MAP_";

#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub review_contract: Address,
    pub token_contract: Option<Address>,
    pub rpc_url: String,
    pub chain_id: u64,
    /// JSON-RPC endpoint of an injected wallet, when one is available
    pub wallet_url: Option<String>,
    pub dev_private_key: String,
    pub min_balance: U256,
    pub registration_reward: u64,
    /// Pause between a submission event and re-reading the review list
    pub event_settle_delay: Duration,
    /// Pause after asking the wallet to change chains
    pub network_switch_delay: Duration,
}

impl NetworkConfig {
    pub fn sepolia() -> Self {
        Self {
            review_contract: preset_address("0xCD4603b516a5388786DcB8f1b7FEF2EC0777B9F2"),
            token_contract: Some(preset_address("0xd7C7Db332a3f4D12629f03D669b36FDc4601B414")),
            rpc_url: "https://ethereum-sepolia-rpc.publicnode.com".to_string(),
            chain_id: SEPOLIA,
            ..Self::defaults()
        }
    }

    pub fn hardhat() -> Self {
        Self {
            review_contract: preset_address("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"),
            token_contract: Some(preset_address("0x5FbDB2315678afecb367f032d93F642f64180aa3")),
            rpc_url: "http://127.0.0.1:8545".to_string(),
            chain_id: HARDHAT,
            ..Self::defaults()
        }
    }

    fn defaults() -> Self {
        Self {
            review_contract: Address::zero(),
            token_contract: None,
            rpc_url: String::new(),
            chain_id: 0,
            wallet_url: None,
            dev_private_key: HARDHAT_DEV_KEY.to_string(),
            min_balance: U256::from(MIN_SUBMIT_BALANCE_WEI),
            registration_reward: REGISTRATION_REWARD,
            event_settle_delay: Duration::from_millis(500),
            network_switch_delay: Duration::from_secs(1),
        }
    }

    /// Load `.env` and apply `SAFETY_MAP_*` overrides on top of `self`
    pub fn with_env_overrides(self) -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        self.with_overrides(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("CONTRACT_ADDRESS") {
            self.review_contract = parse_address(&value)?
                .ok_or_else(|| GatewayError::Config("CONTRACT_ADDRESS is empty".to_string()))?;
        }
        if let Some(value) = lookup("TOKEN_ADDRESS") {
            self.token_contract = parse_address(&value)?;
        }
        if let Some(value) = lookup("RPC_URL") {
            self.rpc_url = value;
        }
        if let Some(value) = lookup("CHAIN_ID") {
            self.chain_id = value
                .trim()
                .parse()
                .map_err(|_| GatewayError::Config(format!("CHAIN_ID is not a number: {value}")))?;
        }
        if let Some(value) = lookup("WALLET_URL") {
            self.wallet_url = Some(value).filter(|url| !url.trim().is_empty());
        }
        if let Some(value) = lookup("PRIVATE_KEY") {
            self.dev_private_key = value;
        }
        Ok(self)
    }

    /// Fail early when no review contract is configured
    pub fn validate(&self) -> Result<()> {
        if self.review_contract.is_zero() {
            return Err(GatewayError::Config(
                "review contract address not configured; deploy the contracts and set CONTRACT_ADDRESS".to_string(),
            ));
        }
        if self.rpc_url.is_empty() {
            return Err(GatewayError::Config("RPC URL not configured".to_string()));
        }
        Ok(())
    }

    pub fn chain_name(&self) -> &'static str {
        chain_name(self.chain_id)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::sepolia()
    }
}

/// Parse an address setting. Empty and zero addresses mean "not deployed".
pub fn parse_address(value: &str) -> Result<Option<Address>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let address = Address::from_str(value)
        .map_err(|_| GatewayError::InvalidAddress(value.to_string()))?;
    Ok(Some(address).filter(|a| !a.is_zero()))
}

fn preset_address(value: &str) -> Address {
    Address::from_str(value).expect("Invalid preset contract address")
}

/// Companion REST backend for geocoding and review analysis
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl BackendConfig {
    pub const DEFAULT_URL: &'static str = "http://localhost:5000/api";

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_URL)
    }
}
