//! In-process Domain Event Bus
//!
//! Publish/subscribe keyed by [`DomainEventKind`]. Subscriptions are collected
//! into a [`Subscriptions`] list at startup and installed into the bus once;
//! the registry is read-only afterwards.
//!
//! Delivery guarantees:
//! - `publish` never blocks on handlers and never sees their failures
//! - handlers of one kind run one after another, in subscription order
//! - a failing or panicking handler does not stop the ones after it
//! - no ordering across kinds or across separate publications
//! - no history: events published before `install` or with no subscriber are dropped

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use futures::FutureExt;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::domain_event::{DomainEvent, DomainEventKind, EventEnvelope};
use super::operation::panic_message;

/// Receiver of domain events.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// Name used in delivery logs.
    fn name(&self) -> &str;

    async fn handle(&self, envelope: &EventEnvelope) -> anyhow::Result<()>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BusError {
    #[error("a subscription registry is already installed on this bus")]
    AlreadyInstalled,
}

/// Ordered `(kind, handler)` list assembled during bootstrap.
#[derive(Default)]
pub struct Subscriptions {
    entries: Vec<(DomainEventKind, Arc<dyn EventHandler>)>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` for `kind`. Subscribing the same handler twice delivers twice.
    pub fn subscribe(&mut self, kind: DomainEventKind, handler: Arc<dyn EventHandler>) -> &mut Self {
        self.entries.push((kind, handler));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of handlers subscribed to `kind`.
    pub fn count(&self, kind: DomainEventKind) -> usize {
        self.entries.iter().filter(|(k, _)| *k == kind).count()
    }
}

type Registry = HashMap<DomainEventKind, Vec<Arc<dyn EventHandler>>>;

#[derive(Default)]
struct BusInner {
    registry: OnceLock<Registry>,
    in_flight: AtomicUsize,
    idle: Notify,
}

/// Cloneable handle to one bus. Clones share the registry.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Freeze `subscriptions` as this bus's registry.
    pub fn install(&self, subscriptions: Subscriptions) -> Result<(), BusError> {
        let total = subscriptions.len();
        let mut registry: Registry = HashMap::new();
        for (kind, handler) in subscriptions.entries {
            registry.entry(kind).or_default().push(handler);
        }

        self.inner
            .registry
            .set(registry)
            .map_err(|_| BusError::AlreadyInstalled)?;

        info!(subscriptions = total, "Domain event registry installed");
        Ok(())
    }

    pub fn is_installed(&self) -> bool {
        self.inner.registry.get().is_some()
    }

    pub fn subscriber_count(&self, kind: DomainEventKind) -> usize {
        self.inner
            .registry
            .get()
            .and_then(|registry| registry.get(&kind))
            .map_or(0, Vec::len)
    }

    /// Schedule delivery of `event` and return immediately.
    pub fn publish(&self, event: DomainEvent) {
        let kind = event.kind();

        let Some(registry) = self.inner.registry.get() else {
            warn!(event = kind.name(), "Event bus not installed, dropping event");
            return;
        };
        let handlers = match registry.get(&kind) {
            Some(handlers) if !handlers.is_empty() => handlers.clone(),
            _ => {
                debug!(event = kind.name(), "No subscribers, dropping event");
                return;
            }
        };
        let Ok(runtime) = Handle::try_current() else {
            error!(event = kind.name(), "No async runtime, dropping event");
            return;
        };

        let envelope = EventEnvelope::new(event);
        let span = info_span!(
            "domain_event",
            event = kind.name(),
            event_type = kind.event_type(),
            event_id = %envelope.id,
            subject = envelope.event.subject(),
        );
        let guard = InFlight::enter(Arc::clone(&self.inner));

        runtime.spawn(
            async move {
                let _guard = guard;
                deliver(&handlers, &envelope).await;
            }
            .instrument(span),
        );
    }

    /// Resolve once no delivery is pending, including deliveries published by handlers.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.inner.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Number of deliveries scheduled but not finished.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }
}

async fn deliver(handlers: &[Arc<dyn EventHandler>], envelope: &EventEnvelope) {
    for handler in handlers {
        match AssertUnwindSafe(handler.handle(envelope)).catch_unwind().await {
            Ok(Ok(())) => debug!(handler = handler.name(), "Event handled"),
            Ok(Err(err)) => error!(handler = handler.name(), error = %err, "Event handler failed"),
            Err(panic) => error!(
                handler = handler.name(),
                panic = %panic_message(panic.as_ref()),
                "Event handler panicked"
            ),
        }
    }
}

/// Counts one scheduled delivery until dropped.
struct InFlight(Arc<BusInner>);

impl InFlight {
    fn enter(inner: Arc<BusInner>) -> Self {
        inner.in_flight.fetch_add(1, Ordering::SeqCst);
        Self(inner)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}
