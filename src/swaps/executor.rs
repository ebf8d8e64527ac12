/// Runs one swap attempt end to end through the state machine
use crate::config::Config;
use crate::errors::{SwapError, SwapResult};
use crate::logger::{self, LogTag};
use crate::tokens::Token;
use crate::units::{BaseUnitAmount, DecimalAmount};
use crate::wallet::TransactionSigner;
use std::sync::Arc;

use super::approval::{resolve_spender, AuthorizationStep};
use super::planner::SwapPlanner;
use super::quote::{effective_rate, QuoteClient};
use super::router::AggregatorApi;
use super::state::{SwapAttempt, SwapAttemptState};
use super::submission::SubmissionPipeline;
use super::transaction::TransactionBuilder;
use super::types::{EffectiveRate, Quote, TransactionId};

/// Everything needed to start an attempt, captured when the user confirms
#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub source: Token,
    pub destination: Token,
    /// The amount as typed, for the minimum-return display
    pub amount_input: DecimalAmount,
    pub amount: BaseUnitAmount,
    pub account: String,
}

#[derive(Debug, Clone)]
pub struct SwapOutcome {
    pub quote: Quote,
    pub rate: EffectiveRate,
    pub minimum_return: DecimalAmount,
    pub approval_tx: Option<TransactionId>,
    pub swap_tx: TransactionId,
    pub confirmed: bool,
}

pub struct SwapExecutor {
    quotes: QuoteClient,
    planner: SwapPlanner,
    authorization: AuthorizationStep,
    builder: TransactionBuilder,
    submission: SubmissionPipeline,
    rate_decimals: u32,
}

impl SwapExecutor {
    pub fn new(
        api: Arc<dyn AggregatorApi>,
        planner: SwapPlanner,
        authorization: AuthorizationStep,
        submission: SubmissionPipeline,
        chain_id: u64,
        rate_decimals: u32,
    ) -> Self {
        Self {
            quotes: QuoteClient::new(api.clone()),
            planner,
            authorization,
            builder: TransactionBuilder::new(api, chain_id),
            submission,
            rate_decimals,
        }
    }

    pub fn from_config(config: &Config, api: Arc<dyn AggregatorApi>) -> SwapResult<Self> {
        Ok(Self::new(
            api,
            SwapPlanner::from_config(&config.swap, &config.network)?,
            AuthorizationStep::from_config(&config.swap, config.network.chain_id),
            SubmissionPipeline::new(config.swap.wait_for_confirmation),
            config.network.chain_id,
            config.swap.rate_display_decimals,
        ))
    }

    pub fn quotes(&self) -> &QuoteClient {
        &self.quotes
    }

    pub fn planner(&self) -> &SwapPlanner {
        &self.planner
    }

    pub fn rate_decimals(&self) -> u32 {
        self.rate_decimals
    }

    /// Run the attempt, reporting every state change to `on_state`.
    ///
    /// On error the attempt moves to `Failed(reason)` and the error is
    /// returned. Nothing after a failed step runs.
    pub async fn execute(
        &self,
        request: SwapRequest,
        signer: &dyn TransactionSigner,
        on_state: &mut (dyn FnMut(&SwapAttemptState) + Send),
    ) -> SwapResult<SwapOutcome> {
        let mut attempt = SwapAttempt::new();
        let result = self
            .run(&request, signer, &mut attempt, &mut *on_state)
            .await;

        if let Err(e) = &result {
            logger::error(
                LogTag::Session,
                &format!(
                    "Swap {} -> {} failed in {}: {}",
                    request.source.symbol,
                    request.destination.symbol,
                    attempt.state().name(),
                    e
                ),
            );
            if attempt.fail(e.reason()).is_ok() {
                on_state(attempt.state());
            }
        }
        result
    }

    async fn run(
        &self,
        request: &SwapRequest,
        signer: &dyn TransactionSigner,
        attempt: &mut SwapAttempt,
        on_state: &mut (dyn FnMut(&SwapAttemptState) + Send),
    ) -> SwapResult<SwapOutcome> {
        if signer.account().is_none() {
            return Err(SwapError::NoSignerAvailable);
        }

        // Quote again at confirmation time; the displayed one may be stale
        advance(attempt, on_state, SwapAttemptState::QuoteRequested)?;
        let quote = self
            .quotes
            .get_quote(&request.source, &request.destination, &request.amount)
            .await?;
        let rate = effective_rate(&quote, self.rate_decimals)?;
        advance(attempt, on_state, SwapAttemptState::QuoteReady)?;

        let minimum_return = self
            .planner
            .plan_minimum_return(Some(&request.amount_input), Some(&rate))
            .unwrap_or_else(DecimalAmount::zero);
        logger::info(
            LogTag::Quote,
            &format!(
                "{} {} -> at least {} {} (rate {})",
                request.amount_input,
                request.source.symbol,
                minimum_return,
                request.destination.symbol,
                rate
            ),
        );

        let mut approval_tx = None;
        if self.planner.needs_authorization(&request.source.address) {
            advance(attempt, on_state, SwapAttemptState::AuthorizationPending)?;
            let spender = resolve_spender(&quote, self.quotes.api().as_ref()).await?;
            approval_tx = self
                .authorization
                .ensure_allowance(
                    &quote.source_amount,
                    &request.account,
                    &request.source,
                    &spender,
                    signer,
                )
                .await?;
            advance(attempt, on_state, SwapAttemptState::AuthorizationConfirmed)?;
        }

        advance(attempt, on_state, SwapAttemptState::BuildingTransaction)?;
        let minimum_units = self.planner.minimum_destination_units(&quote);
        let descriptor = self
            .builder
            .build_transaction(
                &request.source,
                &request.destination,
                &quote.source_amount,
                &minimum_units,
                &quote,
                &request.account,
            )
            .await?;

        advance(attempt, on_state, SwapAttemptState::AwaitingSignature)?;
        let swap_tx = self.submission.submit(&descriptor, signer).await?;
        advance(attempt, on_state, SwapAttemptState::Submitted(swap_tx.clone()))?;

        let confirmed = self.submission.waits_for_confirmation();
        if confirmed {
            self.submission.confirm(&swap_tx, signer).await?;
            advance(attempt, on_state, SwapAttemptState::Confirmed(swap_tx.clone()))?;
        }

        Ok(SwapOutcome {
            quote,
            rate,
            minimum_return,
            approval_tx,
            swap_tx,
            confirmed,
        })
    }
}

fn advance(
    attempt: &mut SwapAttempt,
    on_state: &mut (dyn FnMut(&SwapAttemptState) + Send),
    next: SwapAttemptState,
) -> SwapResult<()> {
    attempt.transition(next)?;
    logger::debug(LogTag::Session, &format!("Attempt -> {}", attempt.state()));
    on_state(attempt.state());
    Ok(())
}
