//! Swap orchestration
//!
//! Data flow for one attempt:
//! amount input -> [`units`](crate::units) -> [`quote`] -> [`planner`]
//! -> [`approval`] (non-native sources) -> [`transaction`] -> [`submission`].
//!
//! [`controller`] holds the form state and discards late quote responses;
//! [`session`] drives it from an event channel; [`executor`] runs a full
//! attempt through the [`state`] machine.

pub mod approval;
pub mod controller;
pub mod executor;
pub mod planner;
pub mod quote;
pub mod router;
pub mod routers;
pub mod session;
pub mod state;
pub mod submission;
pub mod transaction;
pub mod types;

#[cfg(test)]
mod tests;

pub use approval::AuthorizationStep;
pub use controller::{QuoteApplication, QuoteTicket, SwapController, SwapNotification, SwapView};
pub use executor::{SwapExecutor, SwapOutcome, SwapRequest};
pub use planner::SwapPlanner;
pub use quote::{effective_rate, QuoteClient};
pub use router::AggregatorApi;
pub use routers::ParaSwapRouter;
pub use session::{SwapEvent, SwapSession, SwapSessionHandle};
pub use state::{SwapAttempt, SwapAttemptState};
pub use submission::SubmissionPipeline;
pub use transaction::TransactionBuilder;
pub use types::{EffectiveRate, Quote, QuoteFingerprint, TransactionDescriptor, TransactionId};
