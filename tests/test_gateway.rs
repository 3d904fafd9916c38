use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::abi::{self, Token};
use ethers::contract::EthEvent;
use ethers::providers::{JsonRpcError, MockProvider, MockResponse, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{
    Address, Block, Bytes, Log, Signature, Transaction, TransactionReceipt, H256, U256, U64,
};
use safety_map::config::{NetworkConfig, HARDHAT_DEV_KEY};
use safety_map::contracts::ReviewSubmittedFilter;
use safety_map::models::{ConnectionState, LoginOutcome, ReviewInput, SignerKind};
use safety_map::{BlockchainGateway, GatewayError, SignerProvider, SignerSession};
use serde::Serialize;
use serde_json::json;
use tokio::sync::mpsc;

/// Signer backed by a mocked provider; every RPC answer is queued by the test
struct MockSigner {
    provider: Provider<MockProvider>,
    wallet: LocalWallet,
    reject_login: AtomicBool,
}

#[async_trait]
impl SignerProvider for MockSigner {
    type Client = Provider<MockProvider>;

    fn kind(&self) -> SignerKind {
        SignerKind::LocalKey
    }

    async fn connect(&self, network: &NetworkConfig) -> safety_map::Result<SignerSession<Self::Client>> {
        Ok(SignerSession {
            client: Arc::new(self.provider.clone()),
            account: self.wallet.address(),
            chain_id: network.chain_id,
        })
    }

    async fn sign_message(
        &self,
        _session: &SignerSession<Self::Client>,
        message: &str,
    ) -> safety_map::Result<Signature> {
        if self.reject_login.load(Ordering::SeqCst) {
            return Err(GatewayError::UserRejected("user rejected signing".to_string()));
        }
        self.wallet
            .sign_message(message)
            .await
            .map_err(|e| GatewayError::WalletError(e.to_string()))
    }
}

fn mock_signer(reject_login: bool) -> (MockSigner, MockProvider) {
    let (provider, mock) = Provider::mocked();
    let signer = MockSigner {
        provider: provider.interval(Duration::from_millis(1)),
        wallet: HARDHAT_DEV_KEY.parse().unwrap(),
        reject_login: AtomicBool::new(reject_login),
    };
    (signer, mock)
}

fn test_network() -> NetworkConfig {
    NetworkConfig {
        event_settle_delay: Duration::from_millis(1),
        ..NetworkConfig::hardhat()
    }
}

fn gateway(reject_login: bool) -> (BlockchainGateway<MockSigner>, MockProvider) {
    let (signer, mock) = mock_signer(reject_login);
    (BlockchainGateway::new(signer, test_network()), mock)
}

/// Queue answers in call order; the mock hands out the last pushed first
fn queue(mock: &MockProvider, responses: Vec<MockResponse>) {
    for response in responses.into_iter().rev() {
        mock.push_response(response);
    }
}

fn value<T: Serialize>(value: T) -> MockResponse {
    MockResponse::Value(serde_json::to_value(value).unwrap())
}

fn returns(tokens: &[Token]) -> MockResponse {
    value(encoded(tokens))
}

fn reverted() -> MockResponse {
    MockResponse::Error(JsonRpcError {
        code: 3,
        message: "execution reverted".to_string(),
        data: None,
    })
}

/// Answers a node gives while filling and broadcasting a transaction
fn broadcast(tx_hash: H256) -> Vec<MockResponse> {
    let block = Block::<H256> {
        base_fee_per_gas: Some(U256::from(1u64)),
        ..Block::default()
    };
    vec![
        value(block),
        value(json!({
            "baseFeePerGas": ["0x1"],
            "gasUsedRatio": [0.5],
            "oldestBlock": "0x1",
            "reward": [["0x1"]]
        })),
        value(U256::from(100_000u64)),
        value(tx_hash),
    ]
}

/// Answers a node gives while a transaction is awaited
fn mined(tx_hash: H256, status: u64) -> Vec<MockResponse> {
    let tx = Transaction {
        hash: tx_hash,
        block_number: Some(U64::from(5u64)),
        ..Transaction::default()
    };
    let receipt = TransactionReceipt {
        transaction_hash: tx_hash,
        block_number: Some(U64::from(5u64)),
        status: Some(U64::from(status)),
        ..TransactionReceipt::default()
    };
    vec![value(tx), value(receipt)]
}

fn review_tuple(id: u64, lat: u64, lng: u64, timestamp: u64) -> Token {
    Token::Tuple(vec![
        Token::Uint(U256::from(id)),
        Token::String(format!("Review {id}")),
        Token::Int(U256::from(lat)),
        Token::Int(U256::from(lng)),
        Token::String("Shanghai".to_string()),
        Token::String("Shanghai".to_string()),
        Token::String("Huangpu".to_string()),
        Token::Uint(U256::from(4u8)),
        Token::Uint(U256::from(3u8)),
        Token::Uint(U256::from(2u8)),
        Token::Uint(U256::from(5u8)),
        Token::String("well lit".to_string()),
        Token::String(String::new()),
        Token::String("bright".to_string()),
        Token::Address(Address::repeat_byte(0x11)),
        Token::Uint(U256::from(timestamp)),
    ])
}

fn submitted_log(review_id: u64) -> Log {
    Log {
        topics: vec![
            ReviewSubmittedFilter::signature(),
            H256::from_low_u64_be(review_id),
            H256::from(Address::repeat_byte(0x11)),
        ],
        data: encoded(&[
            Token::String(format!("Review {review_id}")),
            Token::Int(U256::from(31_230_400u64)),
            Token::Int(U256::from(121_473_700u64)),
            Token::Uint(U256::from(1_700_000_000u64)),
        ]),
        ..Log::default()
    }
}

fn encoded(tokens: &[Token]) -> Bytes {
    Bytes::from(abi::encode(tokens))
}

fn reject_next_login(gateway: &BlockchainGateway<MockSigner>) {
    gateway.signer().reject_login.store(true, Ordering::SeqCst);
}

async fn connected() -> (BlockchainGateway<MockSigner>, MockProvider) {
    let (mut gateway, mock) = gateway(false);
    gateway.connect().await.expect("connect");
    (gateway, mock)
}

#[tokio::test]
async fn test_operations_require_connection() {
    let (gateway, _mock) = gateway(false);

    assert_eq!(gateway.state(), ConnectionState::Disconnected);
    assert!(gateway.account().is_none());
    assert!(!gateway.check_connection().await);
    assert!(matches!(gateway.get_review_count().await, Err(GatewayError::NotConnected)));
    assert!(matches!(gateway.get_all_reviews().await, Err(GatewayError::NotConnected)));
    assert!(matches!(gateway.register_or_login().await, Err(GatewayError::NotConnected)));
    assert!(matches!(gateway.is_user_registered(None).await, Err(GatewayError::NotConnected)));
    assert!(matches!(gateway.get_token_symbol().await, Err(GatewayError::NotConnected)));
    assert!(matches!(
        gateway.submit_review(&ReviewInput::default()).await,
        Err(GatewayError::NotConnected)
    ));
    assert!(matches!(
        gateway.on_review_submitted(|_, _| {}),
        Err(GatewayError::NotConnected)
    ));
}

#[tokio::test]
async fn test_connect_opens_session() {
    let (mut gateway, _mock) = gateway(false);

    let account = gateway.connect().await.unwrap();

    assert_eq!(gateway.state(), ConnectionState::Connected);
    assert_eq!(gateway.account(), Some(account.address));
    assert_eq!(
        format!("{:?}", account.address),
        "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
    );
    assert_eq!(account.signer, SignerKind::LocalKey);

    gateway.disconnect();
    assert_eq!(gateway.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_declined_login_signature_aborts_connection() {
    let (mut gateway, _mock) = gateway(true);

    let err = gateway.connect().await.unwrap_err();

    match err {
        GatewayError::UserRejected(message) => assert!(message.contains("signature cancelled")),
        other => panic!("expected UserRejected, got {other:?}"),
    }
    assert_eq!(gateway.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_registered_user_logs_in_without_transaction() {
    let (gateway, mock) = connected().await;
    // one isUserRegistered answer per call; a transaction would find no response queued
    mock.push::<Bytes, _>(encoded(&[Token::Bool(true)])).unwrap();
    mock.push::<Bytes, _>(encoded(&[Token::Bool(true)])).unwrap();

    let first = gateway.register_or_login().await.unwrap();
    let second = gateway.register_or_login().await.unwrap();

    assert_eq!(first, LoginOutcome::returning_user());
    assert!(!second.is_new_user);
    assert_eq!(second.reward_amount, 0);
    assert!(second.tx_hash.is_none());
}

#[tokio::test]
async fn test_registration_check_failure_reads_as_unregistered() {
    let (gateway, _mock) = connected().await;

    assert!(!gateway.is_user_registered(None).await.unwrap());
}

#[tokio::test]
async fn test_review_count() {
    let (gateway, mock) = connected().await;
    mock.push::<Bytes, _>(encoded(&[Token::Uint(U256::from(7u64))])).unwrap();

    assert_eq!(gateway.get_review_count().await.unwrap(), 7);
}

#[tokio::test]
async fn test_empty_chain_short_circuits_listing() {
    let (gateway, mock) = connected().await;
    mock.push::<Bytes, _>(encoded(&[Token::Uint(U256::zero())])).unwrap();

    let reviews = gateway.get_all_reviews().await.unwrap();

    assert!(reviews.is_empty());
}

#[tokio::test]
async fn test_submit_refused_below_gas_reserve() {
    let (gateway, mock) = connected().await;
    mock.push::<U256, _>(U256::from(10u64)).unwrap();

    let input = ReviewInput {
        latitude: 31.2304,
        longitude: 121.4737,
        overall_safety: 4,
        ..ReviewInput::default()
    };

    match gateway.submit_review(&input).await {
        Err(GatewayError::InsufficientFunds { balance, minimum }) => {
            assert_eq!(balance, U256::from(10u64));
            assert_eq!(minimum, NetworkConfig::hardhat().min_balance);
        }
        other => panic!("expected InsufficientFunds, got {other:?}"),
    }
}

#[tokio::test]
async fn test_token_metadata_falls_back_on_failure() {
    let (gateway, _mock) = connected().await;

    assert_eq!(gateway.get_token_symbol().await.unwrap(), "SAFE");
    assert_eq!(gateway.get_token_name().await.unwrap(), "Safety Token");
    assert_eq!(gateway.get_token_decimals().await.unwrap(), 18);
}

#[tokio::test]
async fn test_token_balance_requires_token_contract() {
    let (signer, _mock) = mock_signer(false);
    let network = NetworkConfig {
        token_contract: None,
        ..test_network()
    };
    let mut gateway = BlockchainGateway::new(signer, network);
    gateway.connect().await.unwrap();

    assert!(matches!(
        gateway.get_token_balance(None).await,
        Err(GatewayError::TokenNotConfigured)
    ));
    assert_eq!(gateway.get_token_symbol().await.unwrap(), "SAFE");
}

#[tokio::test]
async fn test_failed_reconnect_drops_session() {
    let (mut gateway, _mock) = connected().await;
    assert_eq!(gateway.state(), ConnectionState::Connected);

    // second attempt is declined at the login prompt
    reject_next_login(&gateway);
    assert!(gateway.connect().await.is_err());

    assert_eq!(gateway.state(), ConnectionState::Disconnected);
    assert!(gateway.account().is_none());
    assert!(matches!(gateway.get_review_count().await, Err(GatewayError::NotConnected)));
}

#[tokio::test]
async fn test_unconfigured_contract_fails_connect() {
    let (signer, _mock) = mock_signer(false);
    let network = NetworkConfig {
        review_contract: Address::zero(),
        ..test_network()
    };
    let mut gateway = BlockchainGateway::new(signer, network);

    assert!(matches!(gateway.connect().await, Err(GatewayError::Config(_))));
    assert_eq!(gateway.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_reverted_listing_reads_as_empty() {
    let (gateway, mock) = connected().await;
    queue(&mock, vec![returns(&[Token::Uint(U256::from(2u64))]), reverted()]);

    let reviews = gateway.get_all_reviews().await.unwrap();

    assert!(reviews.is_empty());
}

#[tokio::test]
async fn test_undecodable_listing_reads_as_empty() {
    let (gateway, mock) = connected().await;
    queue(&mock, vec![returns(&[Token::Uint(U256::from(2u64))]), value(Bytes::new())]);

    let reviews = gateway.get_all_reviews().await.unwrap();

    assert!(reviews.is_empty());
}

#[tokio::test]
async fn test_listing_decodes_records() {
    let (gateway, mock) = connected().await;
    queue(
        &mock,
        vec![
            returns(&[Token::Uint(U256::from(2u64))]),
            returns(&[Token::Array(vec![
                review_tuple(1, 31_230_400, 121_473_700, 1_700_000_000),
                review_tuple(2, 3950, 12_147, 1_700_000_100),
            ])]),
        ],
    );

    let reviews = gateway.get_all_reviews().await.unwrap();

    assert_eq!(reviews.len(), 2);
    assert_eq!((reviews[0].latitude, reviews[0].longitude), (31.2304, 121.4737));
    assert_eq!(reviews[0].timestamp, 1_700_000_000_000);
    assert_eq!((reviews[1].latitude, reviews[1].longitude), (0.395, 1.2147));
}

#[tokio::test]
async fn test_listing_transport_failure_is_returned() {
    let (gateway, mock) = connected().await;
    queue(
        &mock,
        vec![
            returns(&[Token::Uint(U256::from(2u64))]),
            MockResponse::Error(JsonRpcError {
                code: -32000,
                message: "header not found".to_string(),
                data: None,
            }),
        ],
    );

    assert!(matches!(
        gateway.get_all_reviews().await,
        Err(GatewayError::ContractCallFailed(_))
    ));
}

#[tokio::test]
async fn test_new_user_registration_mined() {
    let (gateway, mock) = connected().await;
    let tx_hash = H256::repeat_byte(0xab);
    let mut responses = vec![returns(&[Token::Bool(false)])];
    responses.extend(broadcast(tx_hash));
    responses.extend(mined(tx_hash, 1));
    queue(&mock, responses);

    let outcome = gateway.register_or_login().await.unwrap();

    assert_eq!(
        outcome,
        LoginOutcome {
            is_new_user: true,
            reward_amount: 100,
            tx_hash: Some(tx_hash),
        }
    );
}

#[tokio::test]
async fn test_reverted_registration_is_error() {
    let (gateway, mock) = connected().await;
    let tx_hash = H256::repeat_byte(0xcd);
    let mut responses = vec![returns(&[Token::Bool(false)])];
    responses.extend(broadcast(tx_hash));
    responses.extend(mined(tx_hash, 0));
    queue(&mock, responses);

    assert!(matches!(
        gateway.register_or_login().await,
        Err(GatewayError::ContractCallFailed(_))
    ));
}

#[tokio::test]
async fn test_submit_returns_once_broadcast() {
    let (gateway, mock) = connected().await;
    let tx_hash = H256::repeat_byte(0x42);
    // balance check, then broadcast; no receipt is queued
    let mut responses = vec![value(U256::exp10(18))];
    responses.extend(broadcast(tx_hash));
    queue(&mock, responses);

    let input = ReviewInput {
        latitude: 31.2304,
        longitude: 121.4737,
        overall_safety: 4,
        ..ReviewInput::default()
    };
    let submitted = tokio::time::timeout(Duration::from_secs(5), gateway.submit_review(&input))
        .await
        .expect("submit waited for a receipt")
        .unwrap();

    assert_eq!(submitted.tx_hash, tx_hash);
    assert!(!submitted.review_id.is_zero());
}

#[tokio::test]
async fn test_subscription_reports_newest_review() {
    let (gateway, mock) = connected().await;
    queue(
        &mock,
        vec![
            value(U256::from(9u64)),
            value(vec![submitted_log(2)]),
            returns(&[Token::Uint(U256::from(2u64))]),
            returns(&[Token::Uint(U256::from(2u64))]),
            returns(&[Token::Array(vec![
                review_tuple(1, 31_230_400, 121_473_700, 1_700_000_000),
                review_tuple(2, 31_230_500, 121_473_800, 1_700_000_100),
            ])]),
        ],
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = gateway
        .on_review_submitted(move |review, count| {
            let _ = tx.send((review, count));
        })
        .unwrap();

    let (review, count) = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no notification")
        .unwrap();

    assert_eq!(review.id, "2");
    assert_eq!(review.timestamp, 1_700_000_100_000);
    assert_eq!(count, 2);

    // dropping the handle stops the listener, releasing the callback
    drop(subscription);
    let closed = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("listener kept running");
    assert!(closed.is_none());
}

#[tokio::test]
async fn test_subscription_cancel_stops_listener() {
    let (gateway, mock) = connected().await;
    // filter installed; every later poll finds nothing
    queue(&mock, vec![value(U256::from(9u64))]);

    let subscription = gateway.on_review_submitted(|_, _| {}).unwrap();
    assert!(subscription.is_active());

    subscription.cancel();
    tokio::time::timeout(Duration::from_secs(5), async {
        while subscription.is_active() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("listener still running after cancel");
}
