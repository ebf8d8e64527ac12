/// Per-attempt swap state machine
///
/// ```text
/// Idle -> QuoteRequested -> QuoteReady
///      -> [AuthorizationPending -> AuthorizationConfirmed]
///      -> BuildingTransaction -> AwaitingSignature -> Submitted -> Confirmed
/// ```
///
/// `Failed` is reachable from every non-terminal state. Transitions are
/// checked; an illegal one is an error and leaves the state untouched.
use crate::errors::{SwapError, SwapResult};
use chrono::{DateTime, Utc};
use std::fmt;

use super::types::TransactionId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapAttemptState {
    Idle,
    QuoteRequested,
    QuoteReady,
    AuthorizationPending,
    AuthorizationConfirmed,
    BuildingTransaction,
    AwaitingSignature,
    Submitted(TransactionId),
    Confirmed(TransactionId),
    Failed(String),
}

impl SwapAttemptState {
    pub fn name(&self) -> &'static str {
        match self {
            SwapAttemptState::Idle => "Idle",
            SwapAttemptState::QuoteRequested => "QuoteRequested",
            SwapAttemptState::QuoteReady => "QuoteReady",
            SwapAttemptState::AuthorizationPending => "AuthorizationPending",
            SwapAttemptState::AuthorizationConfirmed => "AuthorizationConfirmed",
            SwapAttemptState::BuildingTransaction => "BuildingTransaction",
            SwapAttemptState::AwaitingSignature => "AwaitingSignature",
            SwapAttemptState::Submitted(_) => "Submitted",
            SwapAttemptState::Confirmed(_) => "Confirmed",
            SwapAttemptState::Failed(_) => "Failed",
        }
    }

    /// States an attempt can end in. `Submitted` only ends an attempt that
    /// does not wait for confirmation, so it is not listed here.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SwapAttemptState::Confirmed(_) | SwapAttemptState::Failed(_)
        )
    }

    /// An attempt is running between leaving Idle and reaching an end state
    pub fn is_in_progress(&self) -> bool {
        !matches!(
            self,
            SwapAttemptState::Idle
                | SwapAttemptState::Submitted(_)
                | SwapAttemptState::Confirmed(_)
                | SwapAttemptState::Failed(_)
        )
    }

    pub fn can_transition_to(&self, next: &SwapAttemptState) -> bool {
        use SwapAttemptState::*;

        match (self, next) {
            // Inputs changed: back to Idle once nothing is running
            (current, Idle) => !current.is_in_progress(),
            (current, Failed(_)) => !current.is_terminal(),

            (Idle, QuoteRequested) => true,
            (QuoteRequested, QuoteReady) => true,
            (QuoteReady, AuthorizationPending) => true,
            (QuoteReady, BuildingTransaction) => true,
            (AuthorizationPending, AuthorizationConfirmed) => true,
            (AuthorizationConfirmed, BuildingTransaction) => true,
            (BuildingTransaction, AwaitingSignature) => true,
            (AwaitingSignature, Submitted(_)) => true,
            (Submitted(submitted), Confirmed(confirmed)) => submitted == confirmed,
            _ => false,
        }
    }
}

impl fmt::Display for SwapAttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwapAttemptState::Submitted(tx) | SwapAttemptState::Confirmed(tx) => {
                write!(f, "{}({})", self.name(), tx)
            }
            SwapAttemptState::Failed(reason) => write!(f, "Failed({})", reason),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// One swap attempt: its current state plus the timestamped history
#[derive(Debug, Clone)]
pub struct SwapAttempt {
    state: SwapAttemptState,
    history: Vec<(SwapAttemptState, DateTime<Utc>)>,
}

impl Default for SwapAttempt {
    fn default() -> Self {
        Self::new()
    }
}

impl SwapAttempt {
    pub fn new() -> Self {
        Self {
            state: SwapAttemptState::Idle,
            history: vec![(SwapAttemptState::Idle, Utc::now())],
        }
    }

    pub fn state(&self) -> &SwapAttemptState {
        &self.state
    }

    pub fn history(&self) -> &[(SwapAttemptState, DateTime<Utc>)] {
        &self.history
    }

    pub fn transition(&mut self, next: SwapAttemptState) -> SwapResult<()> {
        if !self.state.can_transition_to(&next) {
            return Err(SwapError::InvalidStateTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.history.push((next.clone(), Utc::now()));
        self.state = next;
        Ok(())
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> SwapResult<()> {
        self.transition(SwapAttemptState::Failed(reason.into()))
    }
}
