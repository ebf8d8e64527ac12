/// Quote retrieval and rate computation
use crate::errors::{SwapError, SwapResult};
use crate::logger::{self, LogTag};
use crate::tokens::Token;
use crate::units::{BaseUnitAmount, DecimalAmount};
use chrono::Utc;
use num_bigint::BigUint;
use std::sync::Arc;

use super::router::{AggregatorApi, RateRequest};
use super::types::{EffectiveRate, Quote};

/// Fetches quotes through one aggregator. One call per request, no retries.
#[derive(Clone)]
pub struct QuoteClient {
    api: Arc<dyn AggregatorApi>,
}

impl QuoteClient {
    pub fn new(api: Arc<dyn AggregatorApi>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &Arc<dyn AggregatorApi> {
        &self.api
    }

    pub async fn get_quote(
        &self,
        source: &Token,
        destination: &Token,
        amount: &BaseUnitAmount,
    ) -> SwapResult<Quote> {
        if amount.is_zero() {
            return Err(SwapError::invalid_amount(
                "0",
                "amount must be greater than zero",
            ));
        }

        let request = RateRequest {
            source: source.clone(),
            destination: destination.clone(),
            amount: amount.clone(),
        };

        let route = self.api.get_rate(&request).await.map_err(|e| {
            logger::warning(
                LogTag::Quote,
                &format!(
                    "{} quote {} -> {} failed: {}",
                    self.api.name(),
                    source.symbol,
                    destination.symbol,
                    e
                ),
            );
            e.into_swap_error(SwapError::QuoteUnavailable)
        })?;

        logger::debug(
            LogTag::Quote,
            &format!(
                "{} {} -> {} {} via {}",
                route.source_amount,
                source.symbol,
                route.destination_amount,
                destination.symbol,
                self.api.id()
            ),
        );

        Ok(Quote {
            router_id: self.api.id().to_string(),
            source: source.clone(),
            destination: destination.clone(),
            source_amount: route.source_amount,
            destination_amount: route.destination_amount,
            spender: route.token_transfer_proxy,
            route: route.raw,
            fetched_at: Utc::now(),
        })
    }
}

/// `(dest / 10^destDecimals) / (src / 10^srcDecimals)`, rounded half up to
/// `display_decimals` digits
pub fn effective_rate(quote: &Quote, display_decimals: u32) -> SwapResult<EffectiveRate> {
    if quote.source_amount.is_zero() {
        return Err(SwapError::QuoteUnavailable(
            "quoted source amount is zero".to_string(),
        ));
    }

    let ten = BigUint::from(10u32);
    let numerator = quote.destination_amount.as_biguint()
        * ten.pow(u32::from(quote.source.decimals));
    let denominator =
        quote.source_amount.as_biguint() * ten.pow(u32::from(quote.destination.decimals));

    let value = DecimalAmount::from_ratio(&numerator, &denominator, display_decimals)?;
    Ok(EffectiveRate::new(value, display_decimals))
}
