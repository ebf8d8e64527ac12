/// Hand a built transaction to the signer
use crate::errors::{SwapError, SwapResult};
use crate::logger::{self, LogTag};
use crate::wallet::TransactionSigner;

use super::types::{TransactionDescriptor, TransactionId};

fn as_submission_error(err: SwapError) -> SwapError {
    match err {
        SwapError::SubmissionFailed(_) | SwapError::NoSignerAvailable => err,
        other => SwapError::SubmissionFailed(other.reason()),
    }
}

#[derive(Debug, Clone, Default)]
pub struct SubmissionPipeline {
    wait_for_confirmation: bool,
}

impl SubmissionPipeline {
    pub fn new(wait_for_confirmation: bool) -> Self {
        Self {
            wait_for_confirmation,
        }
    }

    pub fn waits_for_confirmation(&self) -> bool {
        self.wait_for_confirmation
    }

    /// Submit for signing. Fails with `NoSignerAvailable` when no account is
    /// connected; any signer or network failure is `SubmissionFailed`.
    pub async fn submit(
        &self,
        descriptor: &TransactionDescriptor,
        signer: &dyn TransactionSigner,
    ) -> SwapResult<TransactionId> {
        if signer.account().is_none() {
            return Err(SwapError::NoSignerAvailable);
        }

        let tx = signer
            .send_transaction(descriptor)
            .await
            .map_err(as_submission_error)?;
        logger::info(LogTag::Submission, &format!("Swap submitted: {}", tx));
        Ok(tx)
    }

    /// Wait for the receipt of a submitted swap; a revert is `SubmissionFailed`
    pub async fn confirm(
        &self,
        tx: &TransactionId,
        signer: &dyn TransactionSigner,
    ) -> SwapResult<()> {
        let receipt = signer
            .wait_for_receipt(tx)
            .await
            .map_err(as_submission_error)?;
        if !receipt.succeeded() {
            return Err(SwapError::SubmissionFailed(format!(
                "transaction {} reverted",
                tx
            )));
        }
        logger::info(
            LogTag::Submission,
            &format!(
                "Swap confirmed: {} (block {})",
                tx,
                receipt.block_number.as_deref().unwrap_or("?")
            ),
        );
        Ok(())
    }

    /// `submit`, then `confirm`
    pub async fn submit_and_confirm(
        &self,
        descriptor: &TransactionDescriptor,
        signer: &dyn TransactionSigner,
    ) -> SwapResult<TransactionId> {
        let tx = self.submit(descriptor, signer).await?;
        self.confirm(&tx, signer).await?;
        Ok(tx)
    }
}
