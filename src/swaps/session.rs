/// Event loop that owns a [`SwapController`]
///
/// Input edits, quote results and attempt progress all arrive as
/// [`SwapEvent`]s on one channel. Quote fetches and swap attempts run in
/// spawned tasks that only post events back; they never touch the
/// controller. Every handled event republishes the view on a watch channel.
use crate::errors::{SwapError, SwapResult};
use crate::logger::{self, LogTag};
use crate::tokens::Token;
use crate::wallet::TransactionSigner;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::controller::{QuoteApplication, QuoteTicket, SwapController, SwapView};
use super::executor::{SwapExecutor, SwapOutcome};
use super::state::SwapAttemptState;
use super::types::Quote;

#[derive(Debug)]
pub enum SwapEvent {
    AmountChanged(Option<String>),
    SourceTokenChanged(Token),
    DestinationTokenChanged(Token),
    AccountChanged(Option<String>),
    SwapRequested,
    Shutdown,
    QuoteResolved {
        ticket: QuoteTicket,
        result: SwapResult<Quote>,
    },
    AttemptProgress(SwapAttemptState),
    AttemptFinished(SwapResult<SwapOutcome>),
}

pub struct SwapSessionHandle {
    events: mpsc::UnboundedSender<SwapEvent>,
    view: watch::Receiver<SwapView>,
    task: JoinHandle<()>,
}

impl SwapSessionHandle {
    pub fn send(&self, event: SwapEvent) -> SwapResult<()> {
        self.events
            .send(event)
            .map_err(|_| SwapError::configuration_error("swap session has stopped"))
    }

    pub fn subscribe(&self) -> watch::Receiver<SwapView> {
        self.view.clone()
    }

    /// Current view without waiting for a change
    pub fn current_view(&self) -> SwapView {
        self.view.borrow().clone()
    }

    /// Stop the loop and wait for it to exit. Running tasks are not awaited.
    pub async fn shutdown(self) {
        let _ = self.events.send(SwapEvent::Shutdown);
        if let Err(e) = self.task.await {
            logger::error(LogTag::Session, &format!("Session task ended abnormally: {}", e));
        }
    }
}

pub struct SwapSession {
    controller: SwapController,
    executor: Arc<SwapExecutor>,
    signer: Arc<dyn TransactionSigner>,
    events_tx: mpsc::UnboundedSender<SwapEvent>,
    view_tx: watch::Sender<SwapView>,
}

impl SwapSession {
    /// Start the loop on the current runtime.
    ///
    /// The signer's account is applied first, and a quote for the initial
    /// inputs is requested right away.
    pub fn spawn(
        executor: Arc<SwapExecutor>,
        signer: Arc<dyn TransactionSigner>,
        mut controller: SwapController,
    ) -> SwapSessionHandle {
        controller.set_account(signer.account());

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(controller.view());

        let session = SwapSession {
            controller,
            executor,
            signer,
            events_tx: events_tx.clone(),
            view_tx,
        };
        let task = tokio::spawn(session.run(events_rx));

        SwapSessionHandle {
            events: events_tx,
            view: view_rx,
            task,
        }
    }

    async fn run(mut self, mut events: mpsc::UnboundedReceiver<SwapEvent>) {
        logger::debug(LogTag::Session, "Swap session started");
        let initial = self.controller.refresh_quote();
        self.request_quote(initial);
        self.publish();

        while let Some(event) = events.recv().await {
            if matches!(event, SwapEvent::Shutdown) {
                break;
            }
            self.handle(event);
            self.publish();
        }
        logger::debug(LogTag::Session, "Swap session stopped");
    }

    fn handle(&mut self, event: SwapEvent) {
        match event {
            SwapEvent::AmountChanged(amount) => {
                let ticket = self.controller.set_amount(amount);
                self.request_quote(ticket);
            }
            SwapEvent::SourceTokenChanged(token) => {
                let ticket = self.controller.set_source_token(token);
                self.request_quote(ticket);
            }
            SwapEvent::DestinationTokenChanged(token) => {
                let ticket = self.controller.set_destination_token(token);
                self.request_quote(ticket);
            }
            SwapEvent::AccountChanged(account) => self.controller.set_account(account),
            SwapEvent::SwapRequested => self.start_attempt(),
            SwapEvent::QuoteResolved { ticket, result } => {
                if let QuoteApplication::Rejected(e) = self.controller.apply_quote(&ticket, result) {
                    logger::warning(LogTag::Quote, &format!("Quote rejected: {}", e));
                }
            }
            SwapEvent::AttemptProgress(state) => self.controller.record_attempt_state(state),
            SwapEvent::AttemptFinished(result) => {
                if let Ok(outcome) = &result {
                    logger::info(
                        LogTag::Session,
                        &format!("Swap submitted: {}", outcome.swap_tx),
                    );
                }
                self.controller.finish_swap(result);
            }
            SwapEvent::Shutdown => {}
        }
    }

    fn request_quote(&self, ticket: Option<QuoteTicket>) {
        let Some(ticket) = ticket else {
            return;
        };
        let quotes = self.executor.quotes().clone();
        let events = self.events_tx.clone();

        logger::debug(
            LogTag::Session,
            &format!(
                "Quote #{}: {} {} -> {}",
                ticket.sequence, ticket.amount, ticket.source.symbol, ticket.destination.symbol
            ),
        );
        tokio::spawn(async move {
            let result = quotes
                .get_quote(&ticket.source, &ticket.destination, &ticket.amount)
                .await;
            let _ = events.send(SwapEvent::QuoteResolved { ticket, result });
        });
    }

    fn start_attempt(&mut self) {
        let request = match self.controller.begin_swap() {
            Ok(request) => request,
            Err(e) => {
                logger::warning(LogTag::Session, &format!("Swap refused: {}", e));
                self.controller.reject_swap(e);
                return;
            }
        };

        let executor = self.executor.clone();
        let signer = self.signer.clone();
        let events = self.events_tx.clone();

        tokio::spawn(async move {
            let progress = events.clone();
            let mut on_state = move |state: &SwapAttemptState| {
                let _ = progress.send(SwapEvent::AttemptProgress(state.clone()));
            };
            let result = executor
                .execute(request, signer.as_ref(), &mut on_state)
                .await;
            let _ = events.send(SwapEvent::AttemptFinished(result));
        });
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.controller.view());
    }
}
