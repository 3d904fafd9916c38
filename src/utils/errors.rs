use ethers::providers::{ProviderError, RpcError};
use ethers::types::U256;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Wallet not connected")]
    NotConnected,

    #[error("User rejected the request: {0}")]
    UserRejected(String),

    #[error("Network mismatch: {0}")]
    NetworkMismatch(String),

    #[error("Insufficient funds: balance {balance} wei is below the {minimum} wei needed for gas")]
    InsufficientFunds { balance: U256, minimum: U256 },

    #[error("Contract call failed: {0}")]
    ContractCallFailed(String),

    #[error("Malformed review record: {0}")]
    DecodeFailure(String),

    #[error("Token contract not configured")]
    TokenNotConfigured,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Wallet error: {0}")]
    WalletError(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("RPC error: {0}")]
    RpcError(#[from] ProviderError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;

/// EIP-1193 code for a request the user declined.
pub const USER_REJECTED_CODE: i64 = 4001;

/// Codes wallets return from `wallet_switchEthereumChain` for a chain they don't know.
pub const UNKNOWN_CHAIN_CODES: [i64; 2] = [4902, -32603];

/// Extract the JSON-RPC error code from a provider error, if there is one.
pub fn rpc_error_code(err: &ProviderError) -> Option<i64> {
    err.as_error_response().map(|e| e.code)
}

/// True when the wallet reports that the user declined the request.
pub fn is_user_rejection(err: &ProviderError) -> bool {
    if rpc_error_code(err) == Some(USER_REJECTED_CODE) {
        return true;
    }
    let message = err.to_string().to_lowercase();
    message.contains("user rejected") || message.contains("user denied")
}

impl GatewayError {
    /// Map a provider failure from a wallet prompt, keeping rejections distinct.
    pub fn from_wallet(err: ProviderError) -> Self {
        if is_user_rejection(&err) {
            GatewayError::UserRejected(err.to_string())
        } else {
            GatewayError::RpcError(err)
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, GatewayError::UserRejected(_))
    }
}
