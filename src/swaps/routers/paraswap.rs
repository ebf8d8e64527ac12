/// ParaSwap v5 router
///
/// Prices with `GET /prices`, builds with `POST /transactions/{network}` and
/// looks up the token-transfer proxy with `GET /adapters/contracts`. Failures
/// are decided by the JSON body shape: `{"error": ...}` is a service error
/// whatever the HTTP status.
use crate::config::{with_config, AggregatorConfig};
use crate::errors::{AggregatorError, ServicePayload, SwapError, SwapResult};
use crate::logger::{self, LogTag};
use crate::swaps::router::{AggregatorApi, BuildRequest, PriceRoute, RateRequest};
use crate::swaps::types::RawTransaction;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Longest response body echoed into an error message
const MAX_ERROR_BODY_CHARS: usize = 300;

// ============================================================================
// API TYPES
// ============================================================================

#[derive(Debug, Serialize)]
struct PricesQuery {
    #[serde(rename = "srcToken")]
    src_token: String,
    #[serde(rename = "destToken")]
    dest_token: String,
    amount: String,
    #[serde(rename = "srcDecimals")]
    src_decimals: u8,
    #[serde(rename = "destDecimals")]
    dest_decimals: u8,
    side: &'static str,
    network: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    partner: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PricesResponse {
    #[serde(rename = "priceRoute")]
    price_route: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct TransactionsBody<'a> {
    #[serde(rename = "srcToken")]
    src_token: &'a str,
    #[serde(rename = "destToken")]
    dest_token: &'a str,
    #[serde(rename = "srcAmount")]
    src_amount: String,
    #[serde(rename = "destAmount")]
    dest_amount: String,
    #[serde(rename = "priceRoute")]
    price_route: &'a serde_json::Value,
    #[serde(rename = "userAddress")]
    user_address: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    partner: Option<&'a str>,
    #[serde(rename = "srcDecimals")]
    src_decimals: u8,
    #[serde(rename = "destDecimals")]
    dest_decimals: u8,
}

#[derive(Debug, Deserialize)]
struct ContractsResponse {
    #[serde(rename = "TokenTransferProxy")]
    token_transfer_proxy: String,
}

// ============================================================================
// PARASWAP ROUTER
// ============================================================================

pub struct ParaSwapRouter {
    client: Client,
    api_base: String,
    partner: Option<String>,
    network: u64,
    ignore_checks: bool,
}

impl ParaSwapRouter {
    pub fn new(config: &AggregatorConfig, network: u64) -> SwapResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SwapError::configuration_error(format!("HTTP client: {}", e)))?;

        let partner = Some(config.partner.trim().to_string()).filter(|p| !p.is_empty());

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            partner,
            network,
            ignore_checks: config.ignore_checks,
        })
    }

    /// Build from the global configuration
    pub fn from_config() -> SwapResult<Self> {
        let (aggregator, network) =
            with_config(|cfg| (cfg.aggregator.clone(), cfg.network.chain_id));
        Self::new(&aggregator, network)
    }

    fn prices_query(&self, request: &RateRequest) -> PricesQuery {
        PricesQuery {
            src_token: request.source.address.clone(),
            dest_token: request.destination.address.clone(),
            amount: request.amount.to_string(),
            src_decimals: request.source.decimals,
            dest_decimals: request.destination.decimals,
            side: "SELL",
            network: self.network,
            partner: self.partner.clone(),
        }
    }

    fn transactions_body<'a>(&'a self, request: &'a BuildRequest) -> TransactionsBody<'a> {
        TransactionsBody {
            src_token: &request.source.address,
            dest_token: &request.destination.address,
            src_amount: request.source_amount.to_string(),
            dest_amount: request.destination_amount.to_string(),
            price_route: &request.route,
            user_address: &request.user_address,
            partner: self.partner.as_deref(),
            src_decimals: request.source.decimals,
            dest_decimals: request.destination.decimals,
        }
    }

    async fn read_payload<T: DeserializeOwned>(
        response: reqwest::Response,
        endpoint: &str,
    ) -> Result<T, AggregatorError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AggregatorError::transport(format!("Failed to read {} response: {}", endpoint, e))
        })?;
        logger::verbose(
            LogTag::Api,
            &format!("ParaSwap {} -> {}: {}", endpoint, status, body),
        );
        parse_payload(status, &body, endpoint)
    }
}

/// Decide success or failure from the body shape; the status only shapes
/// the message when the body is not a recognizable payload
fn parse_payload<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
    endpoint: &str,
) -> Result<T, AggregatorError> {
    match serde_json::from_str::<ServicePayload<T>>(body) {
        Ok(payload) => payload.into_result(),
        Err(e) => {
            let snippet: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            if status.is_success() {
                Err(AggregatorError::Transport(SwapError::parse_error(format!(
                    "Unexpected {} response: {} ({})",
                    endpoint, e, snippet
                ))))
            } else {
                Err(AggregatorError::transport(format!(
                    "{} failed ({}): {}",
                    endpoint, status, snippet
                )))
            }
        }
    }
}

#[async_trait]
impl AggregatorApi for ParaSwapRouter {
    fn id(&self) -> &'static str {
        "paraswap"
    }

    fn name(&self) -> &'static str {
        "ParaSwap"
    }

    async fn get_rate(&self, request: &RateRequest) -> Result<PriceRoute, AggregatorError> {
        let query = self.prices_query(request);
        logger::debug(
            LogTag::Api,
            &format!(
                "ParaSwap prices: {} {} -> {} (network {})",
                query.amount, query.src_token, query.dest_token, query.network
            ),
        );

        let start = Instant::now();
        let url = format!("{}/prices", self.api_base);
        let response = self.client.get(&url).query(&query).send().await?;
        let prices: PricesResponse = Self::read_payload(response, "prices").await?;
        let route = PriceRoute::from_raw(prices.price_route)?;

        logger::debug(
            LogTag::Api,
            &format!(
                "ParaSwap route: {} -> {} in {}ms",
                route.source_amount,
                route.destination_amount,
                start.elapsed().as_millis()
            ),
        );
        Ok(route)
    }

    async fn build_tx(&self, request: &BuildRequest) -> Result<RawTransaction, AggregatorError> {
        let url = format!("{}/transactions/{}", self.api_base, self.network);
        let body = self.transactions_body(request);
        logger::debug(
            LogTag::Api,
            &format!(
                "ParaSwap transactions: {} {} -> {} {} for {}",
                body.src_amount,
                body.src_token,
                body.dest_amount,
                body.dest_token,
                body.user_address
            ),
        );

        let response = self
            .client
            .post(&url)
            .query(&[("ignoreChecks", self.ignore_checks)])
            .json(&body)
            .send()
            .await?;
        Self::read_payload(response, "transactions").await
    }

    async fn get_spender(&self) -> Result<String, AggregatorError> {
        let url = format!("{}/adapters/contracts", self.api_base);
        let response = self
            .client
            .get(&url)
            .query(&[("network", self.network)])
            .send()
            .await?;
        let contracts: ContractsResponse = Self::read_payload(response, "adapters/contracts").await?;
        Ok(contracts.token_transfer_proxy)
    }
}
