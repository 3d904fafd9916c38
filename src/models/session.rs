use ethers::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Which kind of signer backs the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignerKind {
    InjectedWallet,
    LocalKey,
}

impl std::fmt::Display for SignerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignerKind::InjectedWallet => write!(f, "injected wallet"),
            SignerKind::LocalKey => write!(f, "local key"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedAccount {
    pub address: Address,
    pub chain_id: u64,
    pub signer: SignerKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginOutcome {
    pub is_new_user: bool,
    pub reward_amount: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<H256>,
}

impl LoginOutcome {
    pub fn returning_user() -> Self {
        Self {
            is_new_user: false,
            reward_amount: 0,
            tx_hash: None,
        }
    }
}

/// A review transaction that was accepted by the node but not yet mined
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedReview {
    pub review_id: U256,
    pub tx_hash: H256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionOutcome {
    pub tx_hash: H256,
    pub block_number: Option<u64>,
    pub status: TxStatus,
}
