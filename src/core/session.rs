//! An open wallet session and the contract operations it can perform

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use ethers::contract::ContractError;
use ethers::prelude::*;
use ethers::providers::MiddlewareError;
use ethers::utils::{format_ether, to_checksum};

use super::traits::SignerSession;
use crate::config::NetworkConfig;
use crate::contracts::{OnchainReview, SafetyReview, SafetyToken};
use crate::coordinates;
use crate::models::{
    ConnectedAccount, LoginOutcome, Review, ReviewInput, SignerKind, SubmittedReview,
    TransactionOutcome, TxStatus,
};
use crate::utils::errors::is_user_rejection;
use crate::utils::{GatewayError, Result};

pub const DEFAULT_TOKEN_SYMBOL: &str = "SAFE";
pub const DEFAULT_TOKEN_NAME: &str = "Safety Token";
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// Signer, account and contract handles held while connected
pub struct WalletSession<M: Middleware> {
    signer: SignerSession<M>,
    kind: SignerKind,
    reviews: SafetyReview<M>,
    token: Option<SafetyToken<M>>,
    min_balance: U256,
    registration_reward: u64,
    pub(crate) settle_delay: Duration,
}

impl<M: Middleware> Clone for WalletSession<M> {
    fn clone(&self) -> Self {
        Self {
            signer: self.signer.clone(),
            kind: self.kind,
            reviews: self.reviews.clone(),
            token: self.token.clone(),
            min_balance: self.min_balance,
            registration_reward: self.registration_reward,
            settle_delay: self.settle_delay,
        }
    }
}

impl<M: Middleware + 'static> WalletSession<M> {
    pub fn new(signer: SignerSession<M>, kind: SignerKind, network: &NetworkConfig) -> Self {
        let reviews = SafetyReview::new(network.review_contract, signer.client.clone());
        let token = network
            .token_contract
            .map(|address| SafetyToken::new(address, signer.client.clone()));
        if token.is_none() {
            tracing::warn!("Token contract not configured; balance queries are unavailable");
        }

        Self {
            signer,
            kind,
            reviews,
            token,
            min_balance: network.min_balance,
            registration_reward: network.registration_reward,
            settle_delay: network.event_settle_delay,
        }
    }

    pub fn account(&self) -> Address {
        self.signer.account
    }

    pub fn signer(&self) -> &SignerSession<M> {
        &self.signer
    }

    pub fn client(&self) -> Arc<M> {
        self.signer.client.clone()
    }

    pub fn connected_account(&self) -> ConnectedAccount {
        ConnectedAccount {
            address: self.signer.account,
            chain_id: self.signer.chain_id,
            signer: self.kind,
        }
    }

    pub(crate) fn review_contract(&self) -> &SafetyReview<M> {
        &self.reviews
    }

    /// True while the node still answers
    pub async fn check_connection(&self) -> bool {
        self.signer.client.get_block_number().await.is_ok()
    }

    /// View call; any failure reads as "not registered"
    pub async fn is_user_registered(&self, address: Option<Address>) -> bool {
        let user = address.unwrap_or(self.signer.account);
        match self.reviews.is_user_registered(user).call().await {
            Ok(registered) => registered,
            Err(e) => {
                tracing::warn!("Registration check for {:?} failed: {}", user, e);
                false
            }
        }
    }

    /// Register on first login; returning users cost no transaction
    pub async fn register_or_login(&self) -> Result<LoginOutcome> {
        if self.is_user_registered(None).await {
            tracing::info!("{:?} already registered", self.signer.account);
            return Ok(LoginOutcome::returning_user());
        }

        tracing::info!("Registering {:?}", self.signer.account);
        let call = self.reviews.register_or_login();
        let pending = call
            .send()
            .await
            .map_err(|e| contract_error("registerOrLogin", e))?;
        let tx_hash = *pending;

        let outcome = self.wait_for_transaction(tx_hash).await?;
        if outcome.status == TxStatus::Failed {
            return Err(GatewayError::ContractCallFailed(format!(
                "registration transaction {:?} reverted",
                tx_hash
            )));
        }

        Ok(LoginOutcome {
            is_new_user: true,
            reward_amount: self.registration_reward,
            tx_hash: Some(tx_hash),
        })
    }

    /// Refuse to submit when the account can't plausibly pay for gas.
    ///
    /// A failed balance lookup is logged and the submission goes ahead.
    async fn ensure_gas_reserve(&self) -> Result<()> {
        let balance = match self.signer.client.get_balance(self.signer.account, None).await {
            Ok(balance) => balance,
            Err(e) => {
                tracing::warn!("Could not check balance before submitting: {}", e);
                return Ok(());
            }
        };

        tracing::debug!("Balance before submit: {} ETH", format_ether(balance));
        if balance < self.min_balance {
            return Err(GatewayError::InsufficientFunds {
                balance,
                minimum: self.min_balance,
            });
        }
        Ok(())
    }

    /// Send a review transaction and return once the node has accepted it.
    ///
    /// Waiting for inclusion is left to [`Self::wait_for_transaction`].
    pub async fn submit_review(&self, input: &ReviewInput) -> Result<SubmittedReview> {
        self.ensure_gas_reserve().await?;

        let review_id = U256::from(now_millis());
        let call = self.submit_review_call(input, review_id);
        let pending = call
            .send()
            .await
            .map_err(|e| contract_error("submitReview", e))?;
        let tx_hash = *pending;

        tracing::info!("Review {} submitted in {:?}", review_id, tx_hash);
        Ok(SubmittedReview { review_id, tx_hash })
    }

    /// `submitReview` call with coordinates in fixed point
    pub(crate) fn submit_review_call(&self, input: &ReviewInput, review_id: U256) -> ContractCall<M, ()> {
        let (lat, lng) = coordinates::encode(input.latitude, input.longitude);

        self.reviews.submit_review(
            review_id,
            input.address.clone(),
            I256::from(lat),
            I256::from(lng),
            input.province.clone(),
            input.city.clone(),
            input.district.clone(),
            input.night_lighting,
            input.security_status,
            input.female_density,
            input.overall_safety,
            input.text_review.clone(),
            input.ai_summary.clone(),
            input.keywords.clone(),
        )
    }

    /// Wait for a transaction to be mined, with the client's default polling
    pub async fn wait_for_transaction(&self, tx_hash: H256) -> Result<TransactionOutcome> {
        let receipt = PendingTransaction::new(tx_hash, self.signer.client.provider())
            .await?
            .ok_or_else(|| {
                GatewayError::ContractCallFailed(format!("transaction {:?} was dropped", tx_hash))
            })?;

        let status = if receipt.status == Some(U64::from(1)) {
            TxStatus::Success
        } else {
            TxStatus::Failed
        };

        Ok(TransactionOutcome {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number.map(|b| b.as_u64()),
            status,
        })
    }

    pub async fn review_count(&self) -> Result<u64> {
        let count = self
            .reviews
            .get_review_count()
            .call()
            .await
            .map_err(|e| contract_error("getReviewCount", e))?;
        Ok(count.low_u64())
    }

    /// Every review on chain, decoded for display.
    ///
    /// Records that fail to decode are logged and skipped. A call failure
    /// raised by the contract itself (revert, undecodable return data)
    /// yields an empty list; transport failures are returned.
    pub async fn all_reviews(&self) -> Result<Vec<Review>> {
        match self.review_count().await {
            Ok(0) => {
                tracing::info!("No reviews on chain");
                return Ok(Vec::new());
            }
            Ok(count) => tracing::debug!("{} reviews on chain", count),
            Err(e) => tracing::warn!("Review count unavailable, fetching list anyway: {}", e),
        }

        let records = match self.reviews.get_all_reviews().call().await {
            Ok(records) => records,
            Err(e) if is_contract_level(&e) => {
                tracing::warn!("getAllReviews failed in the contract, showing no reviews: {}", e);
                return Ok(Vec::new());
            }
            Err(e) => return Err(contract_error("getAllReviews", e)),
        };

        let now = now_millis();
        let reviews: Vec<Review> = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match review_from_record(record, index, now) {
                Ok(review) => Some(review),
                Err(e) => {
                    tracing::error!("Dropping review #{}: {}", index, e);
                    None
                }
            })
            .collect();

        tracing::debug!("Decoded {} reviews", reviews.len());
        Ok(reviews)
    }

    /// Most recent review by timestamp, with the current count
    pub async fn newest_review(&self) -> Result<Option<(Review, u64)>> {
        let count = self.review_count().await?;
        let newest = newest_of(self.all_reviews().await?);
        Ok(newest.map(|review| (review, count)))
    }

    /// Reward balance as tracked by the review contract
    pub async fn user_token_balance(&self, address: Option<Address>) -> Result<U256> {
        let user = address.unwrap_or(self.signer.account);
        self.reviews
            .get_user_token_balance(user)
            .call()
            .await
            .map_err(|e| contract_error("getUserTokenBalance", e))
    }

    fn token(&self) -> Result<&SafetyToken<M>> {
        self.token.as_ref().ok_or(GatewayError::TokenNotConfigured)
    }

    /// Token balance formatted with 18 decimals
    pub async fn token_balance(&self, address: Option<Address>) -> Result<String> {
        let token = self.token()?;
        let user = address.unwrap_or(self.signer.account);
        let balance = token
            .balance_of(user)
            .call()
            .await
            .map_err(|e| contract_error("balanceOf", e))?;
        Ok(format_ether(balance))
    }

    pub async fn token_symbol(&self) -> String {
        let Some(token) = self.token.as_ref() else {
            return DEFAULT_TOKEN_SYMBOL.to_string();
        };
        token.symbol().call().await.unwrap_or_else(|e| {
            tracing::warn!("symbol() failed: {}", e);
            DEFAULT_TOKEN_SYMBOL.to_string()
        })
    }

    pub async fn token_name(&self) -> String {
        let Some(token) = self.token.as_ref() else {
            return DEFAULT_TOKEN_NAME.to_string();
        };
        token.name().call().await.unwrap_or_else(|e| {
            tracing::warn!("name() failed: {}", e);
            DEFAULT_TOKEN_NAME.to_string()
        })
    }

    pub async fn token_decimals(&self) -> u8 {
        let Some(token) = self.token.as_ref() else {
            return DEFAULT_TOKEN_DECIMALS;
        };
        token.decimals().call().await.unwrap_or_else(|e| {
            tracing::warn!("decimals() failed: {}", e);
            DEFAULT_TOKEN_DECIMALS
        })
    }
}

/// Failures raised by the contract rather than the transport
fn is_contract_level<M: Middleware>(err: &ContractError<M>) -> bool {
    matches!(
        err,
        ContractError::Revert(_)
            | ContractError::AbiError(_)
            | ContractError::DecodingError(_)
            | ContractError::DetokenizationError(_)
            | ContractError::ContractNotDeployed
    )
}

pub(crate) fn contract_error<M: Middleware>(method: &str, err: ContractError<M>) -> GatewayError {
    let provider_err = match &err {
        ContractError::MiddlewareError { e } => e.as_provider_error(),
        ContractError::ProviderError { e } => Some(e),
        _ => None,
    };

    if provider_err.map(is_user_rejection).unwrap_or(false) {
        return GatewayError::UserRejected(format!("{} transaction", method));
    }
    GatewayError::ContractCallFailed(format!("{}: {}", method, err))
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

fn coordinate_to_i64(value: I256, field: &str) -> Result<i64> {
    if value > I256::from(i64::MAX) || value < I256::from(i64::MIN) {
        return Err(GatewayError::DecodeFailure(format!("{} out of range: {}", field, value)));
    }
    Ok(value.as_i64())
}

/// Convert a contract record into a display review.
///
/// `now_ms` stands in for records without a timestamp.
pub fn review_from_record(record: OnchainReview, index: usize, now_ms: u64) -> Result<Review> {
    let raw_lat = coordinate_to_i64(record.latitude, "latitude")?;
    let raw_lng = coordinate_to_i64(record.longitude, "longitude")?;
    let (latitude, longitude) = coordinates::decode(raw_lat, raw_lng);

    if record.timestamp > U256::from(u64::MAX) {
        return Err(GatewayError::DecodeFailure(format!(
            "timestamp out of range: {}",
            record.timestamp
        )));
    }
    let timestamp_secs = record.timestamp.as_u64();
    let timestamp = if timestamp_secs == 0 {
        now_ms
    } else {
        timestamp_secs.checked_mul(1000).ok_or_else(|| {
            GatewayError::DecodeFailure(format!("timestamp out of range: {}", timestamp_secs))
        })?
    };

    let submitter = if record.submitter.is_zero() {
        String::new()
    } else {
        to_checksum(&record.submitter, None)
    };

    let original_id = (!record.id.is_zero()).then(|| record.id.to_string());
    let id = original_id.clone().unwrap_or_else(|| {
        Review::synthetic_id(&submitter, timestamp_secs, index, raw_lat, raw_lng)
    });

    Ok(Review {
        id,
        original_id,
        address: record.address_text,
        latitude,
        longitude,
        province: record.province,
        city: record.city,
        district: record.district,
        night_lighting: record.night_lighting,
        security_status: record.security_status,
        female_density: record.female_density,
        overall_safety: record.overall_safety,
        text_review: record.text_review,
        ai_summary: record.ai_summary,
        keywords: record.keywords,
        submitter,
        timestamp,
    })
}

/// Latest review by timestamp; the earliest listed wins a tie
pub fn newest_of(reviews: Vec<Review>) -> Option<Review> {
    reviews
        .into_iter()
        .reduce(|best, review| if review.timestamp > best.timestamp { review } else { best })
}
