/// Transaction assembly from a priced route
use crate::errors::{SwapError, SwapResult};
use crate::logger::{self, LogTag};
use crate::tokens::Token;
use crate::units::{parse_hex_quantity, to_hex_quantity, BaseUnitAmount};
use num_bigint::BigUint;
use std::sync::Arc;

use super::router::{AggregatorApi, BuildRequest};
use super::types::{Quote, RawTransaction, TransactionDescriptor};

#[derive(Clone)]
pub struct TransactionBuilder {
    api: Arc<dyn AggregatorApi>,
    chain_id: u64,
}

impl TransactionBuilder {
    pub fn new(api: Arc<dyn AggregatorApi>, chain_id: u64) -> Self {
        Self { api, chain_id }
    }

    /// Ask the service for the swap transaction and normalize it for the signer
    pub async fn build_transaction(
        &self,
        source: &Token,
        destination: &Token,
        source_amount: &BaseUnitAmount,
        destination_amount: &BaseUnitAmount,
        quote: &Quote,
        sender: &str,
    ) -> SwapResult<TransactionDescriptor> {
        let request = BuildRequest {
            source: source.clone(),
            destination: destination.clone(),
            source_amount: source_amount.clone(),
            destination_amount: destination_amount.clone(),
            route: quote.route.clone(),
            user_address: sender.to_string(),
        };

        let raw = self
            .api
            .build_tx(&request)
            .await
            .map_err(|e| e.into_swap_error(SwapError::TransactionBuildFailed))?;

        let descriptor = normalize(raw, self.chain_id, sender)?;
        logger::debug(
            LogTag::Transaction,
            &format!(
                "Built {} -> {} value={} gas={} gasPrice={}",
                descriptor.from,
                descriptor.to,
                descriptor.value,
                descriptor.gas_limit.as_deref().unwrap_or("estimate"),
                descriptor.gas_price.as_deref().unwrap_or("estimate"),
            ),
        );
        Ok(descriptor)
    }
}

fn hex_field(name: &str, raw: &str) -> SwapResult<String> {
    to_hex_quantity(raw)
        .map_err(|e| SwapError::TransactionBuildFailed(format!("{}: {}", name, e.reason())))
}

/// Convert every numeric field to a hex quantity and check the transaction
/// targets our chain and sender
pub fn normalize(
    raw: RawTransaction,
    chain_id: u64,
    sender: &str,
) -> SwapResult<TransactionDescriptor> {
    if !raw.from.trim().eq_ignore_ascii_case(sender.trim()) {
        return Err(SwapError::TransactionBuildFailed(format!(
            "transaction is from {}, expected {}",
            raw.from, sender
        )));
    }
    if raw.to.trim().is_empty() {
        return Err(SwapError::TransactionBuildFailed(
            "transaction has no recipient".to_string(),
        ));
    }

    let chain_hex = hex_field("chainId", &raw.chain_id)?;
    let reported = parse_hex_quantity(&chain_hex)?;
    if reported != BigUint::from(chain_id) {
        return Err(SwapError::TransactionBuildFailed(format!(
            "transaction is for chain {}, expected {}",
            reported, chain_id
        )));
    }

    Ok(TransactionDescriptor {
        from: raw.from,
        to: raw.to,
        data: raw.data,
        value: hex_field("value", &raw.value)?,
        gas_limit: raw
            .gas
            .as_deref()
            .map(|gas| hex_field("gas", gas))
            .transpose()?,
        gas_price: raw
            .gas_price
            .as_deref()
            .map(|price| hex_field("gasPrice", price))
            .transpose()?,
        chain_id: chain_hex,
    })
}
