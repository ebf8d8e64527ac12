/// Owned orchestration state behind the swap form
///
/// Every input edit bumps a sequence counter and returns a [`QuoteTicket`]
/// describing the quote to fetch. A fetched quote is only shown if its ticket
/// is still the latest one and its fingerprint matches the current inputs;
/// anything else is a late response and is dropped.
use crate::errors::{SwapError, SwapResult};
use crate::logger::{self, LogTag};
use crate::tokens::Token;
use crate::units::{BaseUnitAmount, DecimalAmount};

use super::executor::{SwapOutcome, SwapRequest};
use super::planner::SwapPlanner;
use super::quote::effective_rate;
use super::state::SwapAttemptState;
use super::types::{EffectiveRate, Quote, QuoteFingerprint, TransactionId};

/// A quote request issued for a specific input snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteTicket {
    pub sequence: u64,
    pub fingerprint: QuoteFingerprint,
    pub source: Token,
    pub destination: Token,
    pub amount: BaseUnitAmount,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuoteApplication {
    Applied,
    /// Superseded by a newer request or different inputs; ignored
    Stale,
    Rejected(SwapError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapNotification {
    Success { transaction_id: TransactionId },
    Failure { message: String },
}

/// What the user sees
#[derive(Debug, Clone, PartialEq)]
pub struct SwapView {
    pub source_token: Token,
    pub destination_token: Token,
    pub source_amount: Option<String>,
    /// Shown in the destination field
    pub minimum_return: Option<String>,
    pub rate: Option<String>,
    pub account: Option<String>,
    pub swap_enabled: bool,
    pub state: SwapAttemptState,
    pub input_error: Option<String>,
    pub notification: Option<SwapNotification>,
}

pub struct SwapController {
    source: Token,
    destination: Token,
    amount: Option<String>,
    account: Option<String>,
    sequence: u64,
    quote: Option<(Quote, EffectiveRate)>,
    state: SwapAttemptState,
    attempt_running: bool,
    input_error: Option<String>,
    notification: Option<SwapNotification>,
    planner: SwapPlanner,
    rate_decimals: u32,
}

/// Parse a typed amount. `Ok(None)` means "nothing typed yet".
fn parse_amount(
    input: Option<&str>,
    decimals: u8,
) -> SwapResult<Option<(DecimalAmount, BaseUnitAmount)>> {
    let Some(text) = input.map(str::trim).filter(|text| !text.is_empty()) else {
        return Ok(None);
    };
    let amount = DecimalAmount::parse(text)?;
    let units = amount.to_base_units(decimals);
    if units.is_zero() {
        return Err(SwapError::invalid_amount(
            text,
            "amount must be greater than zero",
        ));
    }
    Ok(Some((amount, units)))
}

impl SwapController {
    pub fn new(source: Token, destination: Token, planner: SwapPlanner, rate_decimals: u32) -> Self {
        Self {
            source,
            destination,
            amount: None,
            account: None,
            sequence: 0,
            quote: None,
            state: SwapAttemptState::Idle,
            attempt_running: false,
            input_error: None,
            notification: None,
            planner,
            rate_decimals,
        }
    }

    pub fn set_amount(&mut self, amount: Option<String>) -> Option<QuoteTicket> {
        self.amount = amount;
        self.refresh_quote()
    }

    pub fn set_source_token(&mut self, token: Token) -> Option<QuoteTicket> {
        self.source = token;
        self.refresh_quote()
    }

    pub fn set_destination_token(&mut self, token: Token) -> Option<QuoteTicket> {
        self.destination = token;
        self.refresh_quote()
    }

    /// Connected account; `None` disconnects and disables swapping
    pub fn set_account(&mut self, account: Option<String>) {
        self.account = account.filter(|a| !a.trim().is_empty());
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn fingerprint(&self) -> QuoteFingerprint {
        QuoteFingerprint::new(
            &self.source.address,
            &self.destination.address,
            self.amount.as_deref().unwrap_or(""),
        )
    }

    /// Invalidate the displayed quote and issue a ticket for the current inputs.
    ///
    /// Returns `None` when there is nothing to quote: no amount, or an amount
    /// that does not parse (the reason goes to `input_error`).
    pub fn refresh_quote(&mut self) -> Option<QuoteTicket> {
        self.sequence += 1;
        self.quote = None;
        self.input_error = None;
        if !self.attempt_running && self.state.can_transition_to(&SwapAttemptState::Idle) {
            self.state = SwapAttemptState::Idle;
        }

        match parse_amount(self.amount.as_deref(), self.source.decimals) {
            Ok(Some((_, units))) => Some(QuoteTicket {
                sequence: self.sequence,
                fingerprint: self.fingerprint(),
                source: self.source.clone(),
                destination: self.destination.clone(),
                amount: units,
            }),
            Ok(None) => None,
            Err(e) => {
                self.input_error = Some(e.to_string());
                None
            }
        }
    }

    /// Show a fetched quote if it still belongs to the current inputs
    pub fn apply_quote(&mut self, ticket: &QuoteTicket, result: SwapResult<Quote>) -> QuoteApplication {
        if ticket.sequence != self.sequence || ticket.fingerprint != self.fingerprint() {
            logger::debug(
                LogTag::Session,
                &format!(
                    "Dropping stale quote #{} (current #{})",
                    ticket.sequence, self.sequence
                ),
            );
            return QuoteApplication::Stale;
        }

        let rated = result.and_then(|quote| {
            let rate = effective_rate(&quote, self.rate_decimals)?;
            Ok((quote, rate))
        });

        match rated {
            Ok((quote, rate)) => {
                logger::debug(
                    LogTag::Session,
                    &format!("Quote #{} applied: rate {}", ticket.sequence, rate),
                );
                self.quote = Some((quote, rate));
                self.input_error = None;
                QuoteApplication::Applied
            }
            Err(e) => {
                self.quote = None;
                self.input_error = Some(e.reason());
                QuoteApplication::Rejected(e)
            }
        }
    }

    /// Capture the inputs for a swap attempt and mark it running
    pub fn begin_swap(&mut self) -> SwapResult<SwapRequest> {
        if self.attempt_running {
            return Err(SwapError::SwapInProgress);
        }
        let account = self.account.clone().ok_or(SwapError::NoSignerAvailable)?;
        let (amount_input, amount) = parse_amount(self.amount.as_deref(), self.source.decimals)?
            .ok_or_else(|| SwapError::invalid_amount("", "amount is empty"))?;

        self.attempt_running = true;
        self.notification = None;
        self.state = SwapAttemptState::Idle;

        Ok(SwapRequest {
            source: self.source.clone(),
            destination: self.destination.clone(),
            amount_input,
            amount,
            account,
        })
    }

    pub fn record_attempt_state(&mut self, state: SwapAttemptState) {
        self.state = state;
    }

    pub fn finish_swap(&mut self, result: SwapResult<SwapOutcome>) {
        self.attempt_running = false;
        self.notification = Some(match result {
            Ok(outcome) => SwapNotification::Success {
                transaction_id: outcome.swap_tx,
            },
            Err(e) => SwapNotification::Failure { message: e.reason() },
        });
    }

    /// Surface a refused swap request without touching the attempt state
    pub fn reject_swap(&mut self, error: SwapError) {
        self.notification = Some(SwapNotification::Failure {
            message: error.to_string(),
        });
    }

    pub fn is_swap_enabled(&self) -> bool {
        self.account.is_some()
            && !self.attempt_running
            && matches!(
                parse_amount(self.amount.as_deref(), self.source.decimals),
                Ok(Some(_))
            )
    }

    pub fn view(&self) -> SwapView {
        let amount = parse_amount(self.amount.as_deref(), self.source.decimals)
            .ok()
            .flatten()
            .map(|(decimal, _)| decimal);
        let rate = self.quote.as_ref().map(|(_, rate)| rate);
        let minimum_return = self
            .planner
            .plan_minimum_return(amount.as_ref(), rate)
            .map(|min| min.to_string());

        SwapView {
            source_token: self.source.clone(),
            destination_token: self.destination.clone(),
            source_amount: self.amount.clone(),
            minimum_return,
            rate: rate.map(|r| r.to_string()),
            account: self.account.clone(),
            swap_enabled: self.is_swap_enabled(),
            state: self.state.clone(),
            input_error: self.input_error.clone(),
            notification: self.notification.clone(),
        }
    }
}
