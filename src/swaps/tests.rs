//! Orchestration tests against a scripted aggregator and signer

use super::router::{AggregatorApi, BuildRequest, PriceRoute, RateRequest};
use super::types::RawTransaction;
use super::*;
use crate::config::NATIVE_TOKEN_SENTINEL;
use crate::errors::{AggregatorError, ServiceError, SwapError, SwapResult};
use crate::tokens::Token;
use crate::units::{to_base_units, BaseUnitAmount, DecimalAmount};
use crate::wallet::{TransactionReceipt, TransactionSigner};
use async_trait::async_trait;
use num_bigint::BigUint;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};

const ACCOUNT: &str = "0x1111111111111111111111111111111111111111";
const SPENDER: &str = "0x216B4B4Ba9F3e719726886d34a177484278Bfcae";
const AUGUSTUS: &str = "0xDEF171Fe48CF0115B1d80b88dc8eAB59176FEe57";
const APPROVE_PREFIX: &str = "0x095ea7b3";

fn matic() -> Token {
    Token::new(NATIVE_TOKEN_SENTINEL, 18, "MATIC", "Polygon")
}

fn usdc() -> Token {
    Token::new("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174", 6, "USDC", "USD Coin (PoS)")
}

fn dg() -> Token {
    Token::new("0x2a93172c8DCCbfBC60a39d56183B7279a2F647b4", 18, "DG", "decentral.games")
}

fn service_error(message: &str) -> AggregatorError {
    AggregatorError::Service(ServiceError {
        message: message.to_string(),
    })
}

/// Route that prices one source unit at `rate` destination units
fn route_at_rate(request: &RateRequest, rate: u32, proxy: Option<&str>) -> PriceRoute {
    let ten = BigUint::from(10u32);
    let dest = request.amount.as_biguint()
        * BigUint::from(rate)
        * ten.pow(u32::from(request.destination.decimals))
        / ten.pow(u32::from(request.source.decimals));
    PriceRoute {
        source_amount: request.amount.clone(),
        destination_amount: BaseUnitAmount::new(dest.clone()),
        token_transfer_proxy: proxy.map(str::to_string),
        raw: json!({
            "srcAmount": request.amount.to_string(),
            "destAmount": dest.to_string(),
            "tokenTransferProxy": proxy,
        }),
    }
}

// =============================================================================
// MOCK AGGREGATOR
// =============================================================================

type RateFn = Box<dyn Fn(&RateRequest) -> Result<PriceRoute, AggregatorError> + Send + Sync>;
type BuildFn = Box<dyn Fn(&BuildRequest) -> Result<RawTransaction, AggregatorError> + Send + Sync>;

struct MockAggregator {
    rate: RateFn,
    build: BuildFn,
    rate_gate: Option<(BaseUnitAmount, Arc<Notify>)>,
    build_gate: Option<Arc<Notify>>,
    calls: Mutex<Vec<String>>,
    builds: Mutex<Vec<BuildRequest>>,
}

impl MockAggregator {
    fn new() -> Self {
        Self {
            rate: Box::new(|request| Ok(route_at_rate(request, 2, Some(SPENDER)))),
            build: Box::new(|request| {
                let value = if request.source.address == NATIVE_TOKEN_SENTINEL {
                    request.source_amount.to_string()
                } else {
                    "0".to_string()
                };
                Ok(RawTransaction {
                    from: request.user_address.clone(),
                    to: AUGUSTUS.to_string(),
                    value,
                    data: "0x54e3f31b".to_string(),
                    gas_price: Some("30000000000".to_string()),
                    gas: None,
                    chain_id: "137".to_string(),
                })
            }),
            rate_gate: None,
            build_gate: None,
            calls: Mutex::new(Vec::new()),
            builds: Mutex::new(Vec::new()),
        }
    }

    fn with_rate(
        mut self,
        rate: impl Fn(&RateRequest) -> Result<PriceRoute, AggregatorError> + Send + Sync + 'static,
    ) -> Self {
        self.rate = Box::new(rate);
        self
    }

    fn with_build(
        mut self,
        build: impl Fn(&BuildRequest) -> Result<RawTransaction, AggregatorError> + Send + Sync + 'static,
    ) -> Self {
        self.build = Box::new(build);
        self
    }

    /// Hold `get_rate` for `amount` until the gate is notified
    fn gate_rate(mut self, amount: BaseUnitAmount, gate: Arc<Notify>) -> Self {
        self.rate_gate = Some((amount, gate));
        self
    }

    fn gate_build(mut self, gate: Arc<Notify>) -> Self {
        self.build_gate = Some(gate);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn count(&self, name: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.starts_with(name))
            .count()
    }
}

#[async_trait]
impl AggregatorApi for MockAggregator {
    fn id(&self) -> &'static str {
        "mock"
    }

    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn get_rate(&self, request: &RateRequest) -> Result<PriceRoute, AggregatorError> {
        self.calls.lock().push(format!("get_rate:{}", request.amount));
        if let Some((amount, gate)) = &self.rate_gate {
            if amount == &request.amount {
                gate.notified().await;
            }
        }
        (self.rate)(request)
    }

    async fn build_tx(&self, request: &BuildRequest) -> Result<RawTransaction, AggregatorError> {
        self.calls.lock().push("build_tx".to_string());
        self.builds.lock().push(request.clone());
        if let Some(gate) = &self.build_gate {
            gate.notified().await;
        }
        (self.build)(request)
    }

    async fn get_spender(&self) -> Result<String, AggregatorError> {
        self.calls.lock().push("get_spender".to_string());
        Ok(SPENDER.to_string())
    }
}

// =============================================================================
// MOCK SIGNER
// =============================================================================

struct MockSigner {
    account: Option<String>,
    allowance: BaseUnitAmount,
    approval_status: &'static str,
    swap_status: &'static str,
    swap_error: Option<SwapError>,
    sent: Mutex<Vec<TransactionDescriptor>>,
    receipts_requested: Mutex<Vec<TransactionId>>,
}

impl MockSigner {
    fn connected() -> Self {
        Self {
            account: Some(ACCOUNT.to_string()),
            allowance: BaseUnitAmount::zero(),
            approval_status: "0x1",
            swap_status: "0x1",
            swap_error: None,
            sent: Mutex::new(Vec::new()),
            receipts_requested: Mutex::new(Vec::new()),
        }
    }

    fn disconnected() -> Self {
        Self {
            account: None,
            ..Self::connected()
        }
    }

    fn sent(&self) -> Vec<TransactionDescriptor> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl TransactionSigner for MockSigner {
    fn account(&self) -> Option<String> {
        self.account.clone()
    }

    async fn send_transaction(
        &self,
        descriptor: &TransactionDescriptor,
    ) -> SwapResult<TransactionId> {
        self.sent.lock().push(descriptor.clone());
        if descriptor.data.starts_with(APPROVE_PREFIX) {
            return Ok(TransactionId("0xapproval".to_string()));
        }
        match &self.swap_error {
            Some(err) => Err(err.clone()),
            None => Ok(TransactionId("0xswap".to_string())),
        }
    }

    async fn call(&self, _to: &str, _data: &str) -> SwapResult<String> {
        Ok(format!("0x{:0>64}", format!("{:x}", self.allowance.as_biguint())))
    }

    async fn wait_for_receipt(&self, id: &TransactionId) -> SwapResult<TransactionReceipt> {
        self.receipts_requested.lock().push(id.clone());
        let status = if id.as_str() == "0xapproval" {
            self.approval_status
        } else {
            self.swap_status
        };
        Ok(TransactionReceipt {
            transaction_hash: id.to_string(),
            status: Some(status.to_string()),
            block_number: Some("0x1".to_string()),
        })
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn executor(api: Arc<MockAggregator>, slippage_bps: u16, wait: bool) -> SwapExecutor {
    SwapExecutor::new(
        api,
        SwapPlanner::new(slippage_bps, NATIVE_TOKEN_SENTINEL).unwrap(),
        AuthorizationStep::new(137, true),
        SubmissionPipeline::new(wait),
        137,
        5,
    )
}

fn request(source: Token, destination: Token, amount: &str) -> SwapRequest {
    SwapRequest {
        amount: to_base_units(amount, source.decimals).unwrap(),
        amount_input: DecimalAmount::parse(amount).unwrap(),
        source,
        destination,
        account: ACCOUNT.to_string(),
    }
}

async fn run(
    executor: &SwapExecutor,
    request: SwapRequest,
    signer: &MockSigner,
) -> (SwapResult<SwapOutcome>, Vec<SwapAttemptState>) {
    let mut states = Vec::new();
    let mut on_state = |state: &SwapAttemptState| states.push(state.clone());
    let result = executor.execute(request, signer, &mut on_state).await;
    (result, states)
}

fn tx_id(id: &str) -> TransactionId {
    TransactionId(id.to_string())
}

// =============================================================================
// EXECUTOR
// =============================================================================

#[tokio::test]
async fn test_native_source_skips_authorization() {
    let api = Arc::new(MockAggregator::new());
    let signer = MockSigner::connected();
    let executor = executor(api.clone(), 0, false);

    let (result, states) = run(&executor, request(matic(), dg(), "1"), &signer).await;
    let outcome = result.unwrap();

    assert_eq!(
        states,
        vec![
            SwapAttemptState::QuoteRequested,
            SwapAttemptState::QuoteReady,
            SwapAttemptState::BuildingTransaction,
            SwapAttemptState::AwaitingSignature,
            SwapAttemptState::Submitted(tx_id("0xswap")),
        ]
    );
    assert_eq!(outcome.rate.to_string(), "2.00000");
    assert_eq!(outcome.minimum_return.to_string(), "2");
    assert_eq!(outcome.approval_tx, None);
    assert_eq!(outcome.swap_tx, tx_id("0xswap"));
    assert!(!outcome.confirmed);

    let sent = signer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, AUGUSTUS);
    assert_eq!(sent[0].value, "0xde0b6b3a7640000");
    assert_eq!(sent[0].chain_id, "0x89");
    assert_eq!(sent[0].gas_price.as_deref(), Some("0x6fc23ac00"));
    assert_eq!(sent[0].gas_limit, None);

    assert_eq!(api.count("get_spender"), 0);
    let builds = api.builds.lock().clone();
    assert_eq!(builds[0].destination_amount.to_string(), "2000000000000000000");
}

#[tokio::test]
async fn test_token_source_approves_source_token_before_swap() {
    let api = Arc::new(MockAggregator::new());
    let signer = MockSigner::connected();
    let executor = executor(api.clone(), 0, false);

    let (result, states) = run(&executor, request(usdc(), dg(), "1.5"), &signer).await;
    let outcome = result.unwrap();

    assert_eq!(
        states,
        vec![
            SwapAttemptState::QuoteRequested,
            SwapAttemptState::QuoteReady,
            SwapAttemptState::AuthorizationPending,
            SwapAttemptState::AuthorizationConfirmed,
            SwapAttemptState::BuildingTransaction,
            SwapAttemptState::AwaitingSignature,
            SwapAttemptState::Submitted(tx_id("0xswap")),
        ]
    );
    assert_eq!(outcome.approval_tx, Some(tx_id("0xapproval")));

    let sent = signer.sent();
    assert_eq!(sent.len(), 2);
    let approval = &sent[0];
    assert_eq!(approval.to, usdc().address);
    assert_eq!(approval.value, "0x0");
    assert!(approval.data.starts_with(APPROVE_PREFIX));
    assert!(approval
        .data
        .contains(&SPENDER.trim_start_matches("0x").to_lowercase()));
    // 1.5 USDC = 1_500_000 = 0x16e360
    assert!(approval.data.ends_with("16e360"));
    assert_eq!(sent[1].to, AUGUSTUS);
    assert_eq!(sent[1].value, "0x0");
}

#[tokio::test]
async fn test_sufficient_allowance_skips_approve() {
    let api = Arc::new(MockAggregator::new());
    let signer = MockSigner {
        allowance: BaseUnitAmount::from(10_000_000),
        ..MockSigner::connected()
    };
    let executor = executor(api, 0, false);

    let (result, states) = run(&executor, request(usdc(), dg(), "1.5"), &signer).await;
    let outcome = result.unwrap();

    assert_eq!(outcome.approval_tx, None);
    assert!(states.contains(&SwapAttemptState::AuthorizationConfirmed));
    let sent = signer.sent();
    assert_eq!(sent.len(), 1);
    assert!(!sent[0].data.starts_with(APPROVE_PREFIX));
}

#[tokio::test]
async fn test_authorization_failure_prevents_build_and_submit() {
    let api = Arc::new(MockAggregator::new());
    let signer = MockSigner {
        approval_status: "0x0",
        ..MockSigner::connected()
    };
    let executor = executor(api.clone(), 0, false);

    let (result, states) = run(&executor, request(usdc(), dg(), "1"), &signer).await;

    match result {
        Err(SwapError::AuthorizationFailed(reason)) => {
            assert!(reason.contains("reverted"), "{}", reason)
        }
        other => panic!("expected AuthorizationFailed, got {:?}", other),
    }
    assert_eq!(api.count("build_tx"), 0);
    assert_eq!(signer.sent().len(), 1, "only the approval was sent");
    assert!(matches!(states.last(), Some(SwapAttemptState::Failed(_))));
    assert!(!states.contains(&SwapAttemptState::BuildingTransaction));
}

#[tokio::test]
async fn test_quote_unavailable_aborts_attempt() {
    let api = Arc::new(
        MockAggregator::new().with_rate(|_| Err(service_error("No routes found with enough liquidity"))),
    );
    let signer = MockSigner::connected();
    let executor = executor(api.clone(), 0, false);

    let (result, states) = run(&executor, request(matic(), dg(), "1"), &signer).await;

    assert_eq!(
        result.unwrap_err(),
        SwapError::QuoteUnavailable("No routes found with enough liquidity".to_string())
    );
    assert_eq!(
        states,
        vec![
            SwapAttemptState::QuoteRequested,
            SwapAttemptState::Failed("No routes found with enough liquidity".to_string()),
        ]
    );
    assert_eq!(api.count("build_tx"), 0);
    assert!(signer.sent().is_empty());
}

#[tokio::test]
async fn test_transport_failure_is_network_error() {
    let api = Arc::new(
        MockAggregator::new().with_rate(|_| Err(AggregatorError::transport("connection refused"))),
    );
    let signer = MockSigner::connected();
    let executor = executor(api, 0, false);

    let (result, _) = run(&executor, request(matic(), dg(), "1"), &signer).await;
    assert_eq!(
        result.unwrap_err(),
        SwapError::Network("connection refused".to_string())
    );
}

#[tokio::test]
async fn test_build_error_is_transaction_build_failed() {
    let api = Arc::new(
        MockAggregator::new().with_build(|_| Err(service_error("Unable to build transaction"))),
    );
    let signer = MockSigner::connected();
    let executor = executor(api, 0, false);

    let (result, states) = run(&executor, request(matic(), dg(), "1"), &signer).await;

    assert_eq!(
        result.unwrap_err(),
        SwapError::TransactionBuildFailed("Unable to build transaction".to_string())
    );
    assert!(signer.sent().is_empty());
    assert_eq!(
        states.last(),
        Some(&SwapAttemptState::Failed("Unable to build transaction".to_string()))
    );
}

#[tokio::test]
async fn test_wrong_chain_from_build_fails_before_signing() {
    let api = Arc::new(MockAggregator::new().with_build(|request| {
        Ok(RawTransaction {
            from: request.user_address.clone(),
            to: AUGUSTUS.to_string(),
            value: "0".to_string(),
            data: "0x".to_string(),
            gas_price: None,
            gas: None,
            chain_id: "1".to_string(),
        })
    }));
    let signer = MockSigner::connected();
    let executor = executor(api, 0, false);

    let (result, _) = run(&executor, request(matic(), dg(), "1"), &signer).await;
    assert!(matches!(result, Err(SwapError::TransactionBuildFailed(_))));
    assert!(signer.sent().is_empty());
}

#[tokio::test]
async fn test_signer_rejection_is_submission_failed() {
    let api = Arc::new(MockAggregator::new());
    let signer = MockSigner {
        swap_error: Some(SwapError::SubmissionFailed(
            "User denied transaction signature".to_string(),
        )),
        ..MockSigner::connected()
    };
    let executor = executor(api, 0, false);

    let (result, states) = run(&executor, request(matic(), dg(), "1"), &signer).await;

    assert_eq!(
        result.unwrap_err(),
        SwapError::SubmissionFailed("User denied transaction signature".to_string())
    );
    assert_eq!(
        states.last(),
        Some(&SwapAttemptState::Failed(
            "User denied transaction signature".to_string()
        ))
    );
}

#[tokio::test]
async fn test_signer_network_error_is_submission_failed() {
    let api = Arc::new(MockAggregator::new());
    let signer = MockSigner {
        swap_error: Some(SwapError::Network("node unreachable".to_string())),
        ..MockSigner::connected()
    };
    let executor = executor(api, 0, false);

    let (result, _) = run(&executor, request(matic(), dg(), "1"), &signer).await;
    assert!(matches!(result, Err(SwapError::SubmissionFailed(_))));
}

#[tokio::test]
async fn test_no_account_fails_without_side_effects() {
    let api = Arc::new(MockAggregator::new());
    let signer = MockSigner::disconnected();
    let executor = executor(api.clone(), 0, false);

    let (result, states) = run(&executor, request(matic(), dg(), "1"), &signer).await;

    assert_eq!(result.unwrap_err(), SwapError::NoSignerAvailable);
    assert!(api.calls().is_empty());
    assert!(signer.sent().is_empty());
    assert!(matches!(states.as_slice(), [SwapAttemptState::Failed(_)]));
}

#[tokio::test]
async fn test_submission_requires_account() {
    let signer = MockSigner::disconnected();
    let descriptor = TransactionDescriptor {
        from: ACCOUNT.to_string(),
        to: AUGUSTUS.to_string(),
        data: "0x".to_string(),
        value: "0x0".to_string(),
        gas_limit: None,
        gas_price: None,
        chain_id: "0x89".to_string(),
    };
    let result = SubmissionPipeline::new(false).submit(&descriptor, &signer).await;
    assert_eq!(result.unwrap_err(), SwapError::NoSignerAvailable);
    assert!(signer.sent().is_empty());
}

#[tokio::test]
async fn test_submit_and_confirm_reads_the_receipt() {
    let signer = MockSigner::connected();
    let descriptor = TransactionDescriptor {
        from: ACCOUNT.to_string(),
        to: AUGUSTUS.to_string(),
        data: "0x54e3f31b".to_string(),
        value: "0x0".to_string(),
        gas_limit: Some("0x3d090".to_string()),
        gas_price: None,
        chain_id: "0x89".to_string(),
    };
    let tx = SubmissionPipeline::new(true)
        .submit_and_confirm(&descriptor, &signer)
        .await
        .unwrap();
    assert_eq!(tx, tx_id("0xswap"));
    assert_eq!(signer.receipts_requested.lock().clone(), vec![tx_id("0xswap")]);
}

#[tokio::test]
async fn test_waiting_for_confirmation_reaches_confirmed() {
    let api = Arc::new(MockAggregator::new());
    let signer = MockSigner::connected();
    let executor = executor(api, 0, true);

    let (result, states) = run(&executor, request(matic(), dg(), "1"), &signer).await;

    assert!(result.unwrap().confirmed);
    assert_eq!(states.last(), Some(&SwapAttemptState::Confirmed(tx_id("0xswap"))));
    assert_eq!(signer.receipts_requested.lock().clone(), vec![tx_id("0xswap")]);
}

#[tokio::test]
async fn test_reverted_swap_is_submission_failed() {
    let api = Arc::new(MockAggregator::new());
    let signer = MockSigner {
        swap_status: "0x0",
        ..MockSigner::connected()
    };
    let executor = executor(api, 0, true);

    let (result, states) = run(&executor, request(matic(), dg(), "1"), &signer).await;

    assert!(matches!(result, Err(SwapError::SubmissionFailed(_))));
    assert!(states.contains(&SwapAttemptState::Submitted(tx_id("0xswap"))));
    assert!(matches!(states.last(), Some(SwapAttemptState::Failed(_))));
}

#[tokio::test]
async fn test_slippage_reduces_destination_sent_to_build() {
    let api = Arc::new(MockAggregator::new());
    let signer = MockSigner::connected();
    let executor = executor(api.clone(), 50, false);

    let (result, _) = run(&executor, request(matic(), dg(), "1"), &signer).await;
    let outcome = result.unwrap();

    assert_eq!(outcome.minimum_return.to_string(), "1.99");
    let builds = api.builds.lock().clone();
    assert_eq!(builds[0].destination_amount.to_string(), "1990000000000000000");
    assert_eq!(builds[0].source_amount.to_string(), "1000000000000000000");
}

#[tokio::test]
async fn test_spender_is_fetched_when_route_lacks_proxy() {
    let api = Arc::new(MockAggregator::new().with_rate(|request| Ok(route_at_rate(request, 2, None))));
    let signer = MockSigner::connected();
    let executor = executor(api.clone(), 0, false);

    let (result, _) = run(&executor, request(usdc(), dg(), "1"), &signer).await;
    result.unwrap();

    assert_eq!(api.count("get_spender"), 1);
    let approval = &signer.sent()[0];
    assert!(approval
        .data
        .contains(&SPENDER.trim_start_matches("0x").to_lowercase()));
}

#[tokio::test]
async fn test_quote_client_rejects_zero_amount() {
    let api = Arc::new(MockAggregator::new());
    let client = QuoteClient::new(api.clone());
    let result = client.get_quote(&matic(), &dg(), &BaseUnitAmount::zero()).await;
    assert!(matches!(result, Err(SwapError::InvalidAmount { .. })));
    assert!(api.calls().is_empty());
}

// =============================================================================
// SESSION
// =============================================================================

async fn wait_for(
    rx: &mut watch::Receiver<SwapView>,
    predicate: impl Fn(&SwapView) -> bool,
) -> SwapView {
    let wait = async {
        loop {
            {
                let view = rx.borrow_and_update();
                if predicate(&view) {
                    return view.clone();
                }
            }
            if rx.changed().await.is_err() {
                panic!("session closed while waiting");
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .expect("timed out waiting for view")
}

fn session_controller() -> SwapController {
    SwapController::new(
        matic(),
        dg(),
        SwapPlanner::new(0, NATIVE_TOKEN_SENTINEL).unwrap(),
        5,
    )
}

#[tokio::test]
async fn test_session_discards_late_quote() {
    let gate = Arc::new(Notify::new());
    let first_amount = to_base_units("1", 18).unwrap();
    // The first request is priced at 5, the second at 2
    let api = Arc::new(
        MockAggregator::new()
            .with_rate(|request| {
                let rate = if request.amount == to_base_units("1", 18).unwrap() { 5 } else { 2 };
                Ok(route_at_rate(request, rate, Some(SPENDER)))
            })
            .gate_rate(first_amount, gate.clone()),
    );
    let executor = Arc::new(executor(api.clone(), 0, false));
    let signer: Arc<dyn TransactionSigner> = Arc::new(MockSigner::connected());
    let handle = SwapSession::spawn(executor, signer, session_controller());
    let mut rx = handle.subscribe();

    handle.send(SwapEvent::AmountChanged(Some("1".to_string()))).unwrap();
    handle.send(SwapEvent::AmountChanged(Some("2".to_string()))).unwrap();

    let view = wait_for(&mut rx, |view| view.rate.is_some()).await;
    assert_eq!(view.rate.as_deref(), Some("2.00000"));
    assert_eq!(view.minimum_return.as_deref(), Some("4"));

    // Release the first response; it arrives last and must be ignored
    gate.notify_one();
    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("late response was never delivered")
        .unwrap();
    let view = rx.borrow_and_update().clone();
    assert_eq!(view.rate.as_deref(), Some("2.00000"));
    assert_eq!(view.minimum_return.as_deref(), Some("4"));
    assert_eq!(api.count("get_rate"), 2);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_session_runs_a_swap() {
    let api = Arc::new(MockAggregator::new());
    let executor = Arc::new(executor(api, 0, false));
    let signer: Arc<dyn TransactionSigner> = Arc::new(MockSigner::connected());
    let handle = SwapSession::spawn(executor, signer, session_controller());
    let mut rx = handle.subscribe();

    handle.send(SwapEvent::AmountChanged(Some("1".to_string()))).unwrap();
    let view = wait_for(&mut rx, |view| view.rate.is_some()).await;
    assert!(view.swap_enabled);
    assert_eq!(view.minimum_return.as_deref(), Some("2"));

    handle.send(SwapEvent::SwapRequested).unwrap();
    let view = wait_for(&mut rx, |view| view.notification.is_some()).await;

    assert_eq!(
        view.notification,
        Some(SwapNotification::Success {
            transaction_id: tx_id("0xswap")
        })
    );
    assert_eq!(view.state, SwapAttemptState::Submitted(tx_id("0xswap")));
    assert!(view.swap_enabled);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_session_without_account_disables_swap() {
    let api = Arc::new(MockAggregator::new());
    let executor = Arc::new(executor(api.clone(), 0, false));
    let signer: Arc<dyn TransactionSigner> = Arc::new(MockSigner::disconnected());
    let handle = SwapSession::spawn(executor, signer, session_controller());
    let mut rx = handle.subscribe();

    handle.send(SwapEvent::AmountChanged(Some("1".to_string()))).unwrap();
    let view = wait_for(&mut rx, |view| view.rate.is_some()).await;
    assert!(!view.swap_enabled);

    handle.send(SwapEvent::SwapRequested).unwrap();
    let view = wait_for(&mut rx, |view| view.notification.is_some()).await;
    assert_eq!(
        view.notification,
        Some(SwapNotification::Failure {
            message: SwapError::NoSignerAvailable.to_string()
        })
    );
    assert_eq!(view.state, SwapAttemptState::Idle);
    assert_eq!(api.count("build_tx"), 0);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_session_refuses_second_swap_while_running() {
    let gate = Arc::new(Notify::new());
    let api = Arc::new(MockAggregator::new().gate_build(gate.clone()));
    let executor = Arc::new(executor(api.clone(), 0, false));
    let signer: Arc<dyn TransactionSigner> = Arc::new(MockSigner::connected());
    let handle = SwapSession::spawn(executor, signer, session_controller());
    let mut rx = handle.subscribe();

    handle.send(SwapEvent::AmountChanged(Some("1".to_string()))).unwrap();
    wait_for(&mut rx, |view| view.rate.is_some()).await;

    handle.send(SwapEvent::SwapRequested).unwrap();
    wait_for(&mut rx, |view| view.state == SwapAttemptState::BuildingTransaction).await;

    handle.send(SwapEvent::SwapRequested).unwrap();
    let view = wait_for(&mut rx, |view| view.notification.is_some()).await;
    assert_eq!(
        view.notification,
        Some(SwapNotification::Failure {
            message: SwapError::SwapInProgress.to_string()
        })
    );
    assert_eq!(view.state, SwapAttemptState::BuildingTransaction);

    gate.notify_one();
    let view = wait_for(&mut rx, |view| {
        matches!(view.notification, Some(SwapNotification::Success { .. }))
    })
    .await;
    assert_eq!(view.state, SwapAttemptState::Submitted(tx_id("0xswap")));
    assert_eq!(api.count("build_tx"), 1);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_session_amount_edit_clears_quote_and_reports_bad_input() {
    let api = Arc::new(MockAggregator::new());
    let executor = Arc::new(executor(api.clone(), 0, false));
    let signer: Arc<dyn TransactionSigner> = Arc::new(MockSigner::connected());
    let handle = SwapSession::spawn(executor, signer, session_controller());
    let mut rx = handle.subscribe();

    handle.send(SwapEvent::AmountChanged(Some("1".to_string()))).unwrap();
    wait_for(&mut rx, |view| view.rate.is_some()).await;

    handle.send(SwapEvent::AmountChanged(Some("abc".to_string()))).unwrap();
    let view = wait_for(&mut rx, |view| view.input_error.is_some()).await;
    assert!(view.rate.is_none());
    assert!(view.minimum_return.is_none());
    assert!(!view.swap_enabled);
    assert_eq!(api.count("get_rate"), 1);

    handle.send(SwapEvent::DestinationTokenChanged(usdc())).unwrap();
    handle.send(SwapEvent::AmountChanged(Some("3".to_string()))).unwrap();
    let view = wait_for(&mut rx, |view| view.rate.is_some()).await;
    assert_eq!(view.destination_token.symbol, "USDC");
    assert_eq!(view.minimum_return.as_deref(), Some("6"));

    handle.shutdown().await;
}
