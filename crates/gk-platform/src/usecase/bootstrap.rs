//! Subscriber Bootstrap
//!
//! Operations that react to domain events implement [`Bootstrap`]. The
//! composition root calls `bootstrap` once per subscriber after wiring and
//! before serving, then installs the collected [`Subscriptions`] into the bus.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info_span, warn};

use super::domain_event::{DomainEvent, DomainEventKind, EventEnvelope};
use super::event_bus::{EventHandler, Subscriptions};
use super::operation::{Operation, OperationHandle};

/// Startup hook registering an operation's event subscriptions.
///
/// Calling it twice registers the handlers twice.
pub trait Bootstrap: Send + Sync + 'static {
    fn bootstrap(self: Arc<Self>, subscriptions: &mut Subscriptions);
}

/// Maps an event to the subscriber's input; `None` skips the event.
pub type InputExtractor<I> = fn(&DomainEvent) -> Option<I>;

/// Runs an operation for every delivered event.
///
/// The operation's outcome, `ERROR` included, is logged through its handle
/// and never returned to the bus.
pub struct OperationSubscriber<Op: Operation> {
    operation: Arc<Op>,
    extract: InputExtractor<Op::Input>,
}

impl<Op: Operation> OperationSubscriber<Op> {
    pub fn new(operation: Arc<Op>, extract: InputExtractor<Op::Input>) -> Self {
        Self { operation, extract }
    }
}

#[async_trait]
impl<Op: Operation> EventHandler for OperationSubscriber<Op> {
    fn name(&self) -> &str {
        self.operation.name()
    }

    async fn handle(&self, envelope: &EventEnvelope) -> anyhow::Result<()> {
        let Some(input) = (self.extract)(&envelope.event) else {
            warn!(
                operation = self.operation.name(),
                event = envelope.kind().name(),
                "Subscriber received an event it cannot handle"
            );
            return Ok(());
        };

        let span = info_span!("subscriber", operation = self.operation.name());
        OperationHandle::new(Arc::clone(&self.operation))
            .with_logger(span)
            .execute(input)
            .await;
        Ok(())
    }
}

impl Subscriptions {
    /// Subscribe `operation` to `kind`, feeding it the input `extract` builds.
    pub fn subscribe_operation<Op: Operation>(
        &mut self,
        kind: DomainEventKind,
        operation: Arc<Op>,
        extract: InputExtractor<Op::Input>,
    ) -> &mut Self {
        self.subscribe(kind, Arc::new(OperationSubscriber::new(operation, extract)))
    }
}
