use chrono::{SecondsFormat, Utc};
use ethers::types::{Address, Signature, H256, U256};
use ethers::utils::to_checksum;

use super::session::WalletSession;
use super::subscription::ReviewSubscription;
use super::traits::SignerProvider;
use crate::config::NetworkConfig;
use crate::models::{
    ConnectedAccount, ConnectionState, LoginOutcome, Review, ReviewInput, SignerKind,
    SubmittedReview, TransactionOutcome,
};
use crate::utils::{GatewayError, Result};

enum SessionState<S: SignerProvider> {
    Disconnected,
    Connecting,
    Connected(WalletSession<S::Client>),
}

/// Wallet session lifecycle plus every review-contract operation.
///
/// Construct one per application and pass it where it is needed. All
/// operations other than [`connect`](Self::connect) fail with
/// [`GatewayError::NotConnected`] until a session is open.
pub struct BlockchainGateway<S: SignerProvider> {
    signer: S,
    network: NetworkConfig,
    state: SessionState<S>,
}

/// Challenge the user signs to prove control of `account`
pub fn login_message(account: Address, at: chrono::DateTime<Utc>) -> String {
    format!(
        "Sign in to the community safety map\n\nAddress: {}\nTime: {}\n\nThis signature only verifies your identity and costs nothing.",
        to_checksum(&account, None),
        at.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

impl<S: SignerProvider> BlockchainGateway<S> {
    pub fn new(signer: S, network: NetworkConfig) -> Self {
        Self {
            signer,
            network,
            state: SessionState::Disconnected,
        }
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    pub fn signer_kind(&self) -> SignerKind {
        self.signer.kind()
    }

    pub fn state(&self) -> ConnectionState {
        match self.state {
            SessionState::Disconnected => ConnectionState::Disconnected,
            SessionState::Connecting => ConnectionState::Connecting,
            SessionState::Connected(_) => ConnectionState::Connected,
        }
    }

    pub fn account(&self) -> Option<Address> {
        self.session().ok().map(WalletSession::account)
    }

    fn session(&self) -> Result<&WalletSession<S::Client>> {
        match &self.state {
            SessionState::Connected(session) => Ok(session),
            _ => Err(GatewayError::NotConnected),
        }
    }

    /// Open a wallet session and prove ownership with a signed login message.
    ///
    /// Any failure leaves the gateway disconnected. A declined signature is
    /// reported as [`GatewayError::UserRejected`].
    pub async fn connect(&mut self) -> Result<ConnectedAccount> {
        self.state = SessionState::Connecting;

        match self.open_session().await {
            Ok(session) => {
                let account = session.connected_account();
                tracing::info!(
                    "Connected {} via {} on {}",
                    to_checksum(&account.address, None),
                    account.signer,
                    self.network.chain_name()
                );
                self.state = SessionState::Connected(session);
                Ok(account)
            }
            Err(e) => {
                tracing::error!("Wallet connection failed: {}", e);
                self.state = SessionState::Disconnected;
                Err(e)
            }
        }
    }

    async fn open_session(&self) -> Result<WalletSession<S::Client>> {
        self.network.validate()?;
        let signer_session = self.signer.connect(&self.network).await?;

        let message = login_message(signer_session.account, Utc::now());
        match self.signer.sign_message(&signer_session, &message).await {
            Ok(_) => tracing::debug!("Login signature verified"),
            Err(GatewayError::UserRejected(_)) => {
                return Err(GatewayError::UserRejected(
                    "signature cancelled, login aborted".to_string(),
                ))
            }
            Err(e) => {
                return Err(GatewayError::WalletError(format!(
                    "login signature failed: {}",
                    e
                )))
            }
        }

        Ok(WalletSession::new(signer_session, self.signer.kind(), &self.network))
    }

    pub fn disconnect(&mut self) {
        if matches!(self.state, SessionState::Connected(_)) {
            tracing::info!("Wallet session closed");
        }
        self.state = SessionState::Disconnected;
    }

    /// Liveness probe against the node; false when disconnected
    pub async fn check_connection(&self) -> bool {
        match self.session() {
            Ok(session) => session.check_connection().await,
            Err(_) => false,
        }
    }

    pub async fn sign_message(&self, message: &str) -> Result<Signature> {
        let session = self.session()?;
        self.signer.sign_message(session.signer(), message).await
    }

    pub async fn register_or_login(&self) -> Result<LoginOutcome> {
        self.session()?.register_or_login().await
    }

    /// Registration flag for `address`, or the session account.
    ///
    /// Query failures read as `false`.
    pub async fn is_user_registered(&self, address: Option<Address>) -> Result<bool> {
        Ok(self.session()?.is_user_registered(address).await)
    }

    pub async fn submit_review(&self, input: &ReviewInput) -> Result<SubmittedReview> {
        self.session()?.submit_review(input).await
    }

    pub async fn wait_for_transaction(&self, tx_hash: H256) -> Result<TransactionOutcome> {
        self.session()?.wait_for_transaction(tx_hash).await
    }

    pub async fn get_all_reviews(&self) -> Result<Vec<Review>> {
        self.session()?.all_reviews().await
    }

    pub async fn get_review_count(&self) -> Result<u64> {
        self.session()?.review_count().await
    }

    pub async fn get_user_token_balance(&self, address: Option<Address>) -> Result<U256> {
        self.session()?.user_token_balance(address).await
    }

    pub async fn get_token_balance(&self, address: Option<Address>) -> Result<String> {
        self.session()?.token_balance(address).await
    }

    pub async fn get_token_symbol(&self) -> Result<String> {
        Ok(self.session()?.token_symbol().await)
    }

    pub async fn get_token_name(&self) -> Result<String> {
        Ok(self.session()?.token_name().await)
    }

    pub async fn get_token_decimals(&self) -> Result<u8> {
        Ok(self.session()?.token_decimals().await)
    }

    /// Call `callback` with the newest review and the review count after
    /// each submission event, until the returned handle is dropped
    pub fn on_review_submitted<F>(&self, callback: F) -> Result<ReviewSubscription>
    where
        F: Fn(Review, u64) + Send + Sync + 'static,
    {
        let session = self.session()?.clone();
        Ok(ReviewSubscription::spawn(session, callback))
    }
}
