/// Aggregation service abstraction
///
/// A router prices a (source, destination, amount) request, builds the
/// transaction for a priced route, and names the spender that must be
/// approved. Service-reported failures and transport failures stay distinct
/// through [`AggregatorError`].
use crate::errors::AggregatorError;
use crate::tokens::Token;
use crate::units::BaseUnitAmount;
use async_trait::async_trait;
use serde::Deserialize;

use super::types::RawTransaction;

#[derive(Debug, Clone)]
pub struct RateRequest {
    pub source: Token,
    pub destination: Token,
    pub amount: BaseUnitAmount,
}

/// The fields of a price route the workflow reads, plus the route itself
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRoute {
    pub source_amount: BaseUnitAmount,
    pub destination_amount: BaseUnitAmount,
    pub token_transfer_proxy: Option<String>,
    pub raw: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct PriceRouteFields {
    #[serde(rename = "srcAmount")]
    src_amount: BaseUnitAmount,
    #[serde(rename = "destAmount")]
    dest_amount: BaseUnitAmount,
    #[serde(rename = "tokenTransferProxy", default)]
    token_transfer_proxy: Option<String>,
}

impl PriceRoute {
    /// Read the amounts and spender out of a raw route, keeping the raw value
    pub fn from_raw(raw: serde_json::Value) -> Result<Self, AggregatorError> {
        let fields = PriceRouteFields::deserialize(&raw).map_err(|e| {
            AggregatorError::Transport(crate::errors::SwapError::parse_error(format!(
                "price route: {}",
                e
            )))
        })?;
        Ok(Self {
            source_amount: fields.src_amount,
            destination_amount: fields.dest_amount,
            token_transfer_proxy: fields.token_transfer_proxy.filter(|s| !s.is_empty()),
            raw,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub source: Token,
    pub destination: Token,
    pub source_amount: BaseUnitAmount,
    pub destination_amount: BaseUnitAmount,
    pub route: serde_json::Value,
    pub user_address: String,
}

#[async_trait]
pub trait AggregatorApi: Send + Sync {
    /// Short identifier stored on quotes
    fn id(&self) -> &'static str;

    /// Display name
    fn name(&self) -> &'static str;

    async fn get_rate(&self, request: &RateRequest) -> Result<PriceRoute, AggregatorError>;

    async fn build_tx(&self, request: &BuildRequest) -> Result<RawTransaction, AggregatorError>;

    /// Address of the token-transfer proxy, for routes that do not carry it
    async fn get_spender(&self) -> Result<String, AggregatorError>;
}
