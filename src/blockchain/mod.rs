//! Signer providers and the RPC connection they share

pub mod client;
pub mod injected;
pub mod local;
pub mod probe;

pub use client::BlockchainClient;
pub use injected::InjectedWallet;
pub use local::LocalKeySigner;
pub use probe::{probe_signer, SignerChoice};
