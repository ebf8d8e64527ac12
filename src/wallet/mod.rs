//! Signer boundary
//!
//! The swap workflow never holds keys. It hands transactions to a
//! [`TransactionSigner`], which owns the connected account.

mod rpc_signer;

pub use rpc_signer::JsonRpcSigner;

use crate::errors::SwapResult;
use crate::swaps::types::{TransactionDescriptor, TransactionId};
use async_trait::async_trait;
use serde::Deserialize;

/// Mined transaction receipt, as far as the workflow reads it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionReceipt {
    #[serde(rename = "transactionHash")]
    pub transaction_hash: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "blockNumber", default)]
    pub block_number: Option<String>,
}

impl TransactionReceipt {
    /// Post-Byzantium receipts carry `0x1`/`0x0`; a missing status is treated as success
    pub fn succeeded(&self) -> bool {
        !matches!(self.status.as_deref(), Some("0x0") | Some("0x00"))
    }
}

#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Connected account, if any
    fn account(&self) -> Option<String>;

    /// Sign and broadcast; returns the transaction hash
    async fn send_transaction(
        &self,
        descriptor: &TransactionDescriptor,
    ) -> SwapResult<TransactionId>;

    /// Read-only contract call (`eth_call` at the latest block)
    async fn call(&self, to: &str, data: &str) -> SwapResult<String>;

    /// Block until the transaction is mined or the signer's timeout elapses
    async fn wait_for_receipt(&self, id: &TransactionId) -> SwapResult<TransactionReceipt>;
}
