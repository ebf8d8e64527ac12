/// Signer backed by a node or wallet that exposes JSON-RPC account methods
/// (`eth_accounts`, `eth_sendTransaction`)
use super::{TransactionReceipt, TransactionSigner};
use crate::config::{with_config, WalletConfig};
use crate::errors::{SwapError, SwapResult};
use crate::logger::{self, LogTag};
use crate::swaps::types::{TransactionDescriptor, TransactionId};
use crate::units::parse_hex_quantity;
use async_trait::async_trait;
use num_bigint::BigUint;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

pub struct JsonRpcSigner {
    client: Client,
    rpc_url: String,
    account: Option<String>,
    chain_id: u64,
    confirmation_timeout: Duration,
    poll_interval: Duration,
    next_id: AtomicU64,
}

impl JsonRpcSigner {
    /// Connect to the endpoint, verify the chain and pick the account.
    ///
    /// The configured account is used when the endpoint reports it; otherwise
    /// the first reported account; otherwise the signer has no account.
    pub async fn connect(config: &WalletConfig, chain_id: u64) -> SwapResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SwapError::configuration_error(format!("HTTP client: {}", e)))?;

        let mut signer = Self {
            client,
            rpc_url: config.rpc_url.clone(),
            account: None,
            chain_id,
            confirmation_timeout: Duration::from_secs(config.confirmation_timeout_secs),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            next_id: AtomicU64::new(1),
        };

        signer.verify_chain().await?;

        let accounts: Vec<String> = signer.request("eth_accounts", json!([])).await?;
        signer.account = select_account(&config.account, &accounts);

        match &signer.account {
            Some(account) => logger::info(
                LogTag::Wallet,
                &format!("Connected {} on chain {}", account, chain_id),
            ),
            None => logger::warning(
                LogTag::Wallet,
                &format!("{} reports no accounts; swaps are disabled", signer.rpc_url),
            ),
        }
        Ok(signer)
    }

    pub async fn connect_from_config() -> SwapResult<Self> {
        let (wallet, chain_id) = with_config(|cfg| (cfg.wallet.clone(), cfg.network.chain_id));
        Self::connect(&wallet, chain_id).await
    }

    async fn verify_chain(&self) -> SwapResult<()> {
        let reported: String = self.request("eth_chainId", json!([])).await?;
        let reported = parse_hex_quantity(&reported)?;
        if reported != BigUint::from(self.chain_id) {
            return Err(SwapError::configuration_error(format!(
                "endpoint {} is on chain {}, expected {}",
                self.rpc_url, reported, self.chain_id
            )));
        }
        Ok(())
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> SwapResult<T> {
        match self.request_raw(method, params).await? {
            Value::Null => Err(SwapError::network_error(format!(
                "{} returned no result",
                method
            ))),
            value => Ok(serde_json::from_value(value)?),
        }
    }

    /// One JSON-RPC call. An RPC-level error keeps the node's message verbatim.
    async fn request_raw(&self, method: &str, params: Value) -> SwapResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        logger::verbose(LogTag::Wallet, &format!("-> {}", payload));

        let response = self
            .client
            .post(&self.rpc_url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        logger::verbose(LogTag::Wallet, &format!("<- {} {}", status, body));

        let parsed: RpcResponse = serde_json::from_str(&body).map_err(|_| {
            SwapError::network_error(format!("{} failed ({}): {}", method, status, body))
        })?;

        if let Some(error) = parsed.error {
            logger::debug(
                LogTag::Wallet,
                &format!("{} rejected ({}): {}", method, error.code, error.message),
            );
            return Err(rpc_error(method, error.message));
        }
        Ok(parsed.result.unwrap_or(Value::Null))
    }
}

fn select_account(preferred: &str, reported: &[String]) -> Option<String> {
    let preferred = preferred.trim();
    if !preferred.is_empty() {
        if let Some(found) = reported
            .iter()
            .find(|account| account.eq_ignore_ascii_case(preferred))
        {
            return Some(found.clone());
        }
        logger::warning(
            LogTag::Wallet,
            &format!("Configured account {} is not available", preferred),
        );
    }
    reported.first().cloned()
}

/// Signing rejections keep the wallet's wording for the user
fn rpc_error(method: &str, message: String) -> SwapError {
    match method {
        "eth_sendTransaction" => SwapError::SubmissionFailed(message),
        _ => SwapError::network_error(format!("{}: {}", method, message)),
    }
}

#[async_trait]
impl TransactionSigner for JsonRpcSigner {
    fn account(&self) -> Option<String> {
        self.account.clone()
    }

    async fn send_transaction(
        &self,
        descriptor: &TransactionDescriptor,
    ) -> SwapResult<TransactionId> {
        if self.account.is_none() {
            return Err(SwapError::NoSignerAvailable);
        }
        let hash: String = self
            .request("eth_sendTransaction", json!([descriptor]))
            .await?;
        Ok(TransactionId(hash))
    }

    async fn call(&self, to: &str, data: &str) -> SwapResult<String> {
        self.request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    async fn wait_for_receipt(&self, id: &TransactionId) -> SwapResult<TransactionReceipt> {
        let start = Instant::now();
        loop {
            let raw = self
                .request_raw("eth_getTransactionReceipt", json!([id.as_str()]))
                .await?;
            if !raw.is_null() {
                return Ok(serde_json::from_value(raw)?);
            }
            if start.elapsed() >= self.confirmation_timeout {
                return Err(SwapError::network_error(format!(
                    "timed out after {}s waiting for receipt of {}",
                    self.confirmation_timeout.as_secs(),
                    id
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
