/// ERC-20 spender authorization
///
/// Before a non-native source token can be swapped, the aggregator's
/// token-transfer proxy needs an allowance on it. The current allowance is
/// read first; an `approve` is sent only when it falls short.
use crate::config::SwapConfig;
use crate::errors::{SwapError, SwapResult};
use crate::logger::{self, LogTag};
use crate::tokens::Token;
use crate::units::{parse_hex_quantity, BaseUnitAmount};
use crate::wallet::TransactionSigner;

use super::router::AggregatorApi;
use super::types::{Quote, TransactionDescriptor, TransactionId};

/// `approve(address,uint256)`
const APPROVE_SELECTOR: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];
/// `allowance(address,address)`
const ALLOWANCE_SELECTOR: [u8; 4] = [0xdd, 0x62, 0xed, 0x3e];

/// Left-pad a 20-byte address into a 32-byte ABI word
fn address_word(address: &str) -> SwapResult<[u8; 32]> {
    let digits = address
        .trim()
        .strip_prefix("0x")
        .or_else(|| address.trim().strip_prefix("0X"))
        .ok_or_else(|| SwapError::parse_error(format!("address {} lacks 0x prefix", address)))?;
    let bytes = hex::decode(digits)
        .map_err(|e| SwapError::parse_error(format!("address {}: {}", address, e)))?;
    if bytes.len() != 20 {
        return Err(SwapError::parse_error(format!(
            "address {} is {} bytes, expected 20",
            address,
            bytes.len()
        )));
    }
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(&bytes);
    Ok(word)
}

fn encode_call(selector: [u8; 4], words: &[[u8; 32]]) -> String {
    let mut calldata = Vec::with_capacity(4 + 32 * words.len());
    calldata.extend_from_slice(&selector);
    for word in words {
        calldata.extend_from_slice(word);
    }
    format!("0x{}", hex::encode(calldata))
}

pub fn encode_approve(spender: &str, amount: &BaseUnitAmount) -> SwapResult<String> {
    Ok(encode_call(
        APPROVE_SELECTOR,
        &[address_word(spender)?, amount.to_abi_word()?],
    ))
}

pub fn encode_allowance(owner: &str, spender: &str) -> SwapResult<String> {
    Ok(encode_call(
        ALLOWANCE_SELECTOR,
        &[address_word(owner)?, address_word(spender)?],
    ))
}

/// Spender for a quote: the route's proxy, or the service's current one
pub async fn resolve_spender(quote: &Quote, api: &dyn AggregatorApi) -> SwapResult<String> {
    if let Some(spender) = &quote.spender {
        return Ok(spender.clone());
    }
    logger::debug(
        LogTag::Approval,
        "Route carries no token-transfer proxy, asking the service",
    );
    api.get_spender()
        .await
        .map_err(|e| e.into_swap_error(SwapError::AuthorizationFailed))
}

#[derive(Debug, Clone)]
pub struct AuthorizationStep {
    chain_id: u64,
    check_allowance: bool,
}

impl AuthorizationStep {
    pub fn new(chain_id: u64, check_allowance: bool) -> Self {
        Self {
            chain_id,
            check_allowance,
        }
    }

    pub fn from_config(swap: &SwapConfig, chain_id: u64) -> Self {
        Self::new(chain_id, swap.check_allowance)
    }

    /// Make sure `spender` may move `amount` of `token` on behalf of `owner`.
    ///
    /// Returns the approval transaction id, or `None` when the existing
    /// allowance already covers the amount. Any failure, including a
    /// reverted approval, is `AuthorizationFailed`.
    pub async fn ensure_allowance(
        &self,
        amount: &BaseUnitAmount,
        owner: &str,
        token: &Token,
        spender: &str,
        signer: &dyn TransactionSigner,
    ) -> SwapResult<Option<TransactionId>> {
        self.run(amount, owner, token, spender, signer)
            .await
            .map_err(|e| match e {
                SwapError::AuthorizationFailed(_) | SwapError::NoSignerAvailable => e,
                other => SwapError::AuthorizationFailed(other.reason()),
            })
    }

    async fn run(
        &self,
        amount: &BaseUnitAmount,
        owner: &str,
        token: &Token,
        spender: &str,
        signer: &dyn TransactionSigner,
    ) -> SwapResult<Option<TransactionId>> {
        if signer.account().is_none() {
            return Err(SwapError::NoSignerAvailable);
        }

        if self.check_allowance {
            let current = self.current_allowance(owner, token, spender, signer).await?;
            if &current >= amount {
                logger::info(
                    LogTag::Approval,
                    &format!(
                        "{} allowance {} already covers {}",
                        token.symbol, current, amount
                    ),
                );
                return Ok(None);
            }
            logger::debug(
                LogTag::Approval,
                &format!("{} allowance {} < {}", token.symbol, current, amount),
            );
        }

        let descriptor = TransactionDescriptor {
            from: owner.to_string(),
            to: token.address.clone(),
            data: encode_approve(spender, amount)?,
            value: "0x0".to_string(),
            gas_limit: None,
            gas_price: None,
            chain_id: format!("{:#x}", self.chain_id),
        };

        logger::info(
            LogTag::Approval,
            &format!("Approving {} {} for {}", amount, token.symbol, spender),
        );
        let tx = signer.send_transaction(&descriptor).await?;
        let receipt = signer.wait_for_receipt(&tx).await?;
        if !receipt.succeeded() {
            return Err(SwapError::AuthorizationFailed(format!(
                "approval {} reverted",
                tx
            )));
        }

        logger::info(LogTag::Approval, &format!("Approval confirmed: {}", tx));
        Ok(Some(tx))
    }

    async fn current_allowance(
        &self,
        owner: &str,
        token: &Token,
        spender: &str,
        signer: &dyn TransactionSigner,
    ) -> SwapResult<BaseUnitAmount> {
        let result = signer
            .call(&token.address, &encode_allowance(owner, spender)?)
            .await?;
        Ok(BaseUnitAmount::new(parse_hex_quantity(&result)?))
    }
}
