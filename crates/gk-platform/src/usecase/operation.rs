//! Operations and Operation Handles
//!
//! An [`Operation`] is a single-shot use case: `execute(input)` always yields
//! exactly one [`Outcome`], never an escaping error. Callers either match on
//! the returned outcome or go through an [`OperationHandle`], which adds
//! per-channel listeners, outcome logging and panic containment.
//!
//! ```ignore
//! let mut handle = OperationHandle::new(login.clone())
//!     .with_logger(tracing::info_span!("http", route = "/api/auth/login"));
//! handle.on(LoginChannel::AccountNotVerified, |_| metrics.unverified_login());
//! let outcome = handle.execute(input).await;
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use thiserror::Error;
use tracing::{debug, error, info, Instrument, Span};

use super::error::{OperationError, OPERATION_PANICKED};
use super::outcome::{Channel, Outcome};

/// A use case with a fixed, declared set of output channels.
#[async_trait]
pub trait Operation: Send + Sync + 'static {
    type Input: Send + 'static;
    type Outcome: Outcome;

    /// Short name used in logs, e.g. `CreateUserUseCase`.
    fn name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Run the use case. Collaborator failures become the `ERROR` outcome.
    async fn execute(&self, input: Self::Input) -> Self::Outcome;
}

/// Channel name given to [`OperationHandle::on_named`] is not declared by the operation.
#[derive(Debug, Error)]
#[error("channel '{name}' is not declared by {operation}")]
pub struct UndeclaredChannel {
    pub operation: &'static str,
    pub name: String,
}

type ChannelOf<Op> = <<Op as Operation>::Outcome as Outcome>::Channel;
type Listener<O> = Box<dyn FnMut(&O) + Send>;

/// Per-call wrapper around an operation.
///
/// Built per request, consumed by [`execute`](Self::execute).
pub struct OperationHandle<Op: Operation> {
    operation: Arc<Op>,
    listeners: HashMap<ChannelOf<Op>, Vec<Listener<Op::Outcome>>>,
    logger: Option<Span>,
}

impl<Op: Operation> OperationHandle<Op> {
    pub fn new(operation: Arc<Op>) -> Self {
        Self {
            operation,
            listeners: HashMap::new(),
            logger: None,
        }
    }

    /// Log emitted outcomes inside `span`.
    pub fn with_logger(mut self, span: Span) -> Self {
        self.logger = Some(span);
        self
    }

    /// Register a callback for a declared channel. Callbacks run in registration order.
    pub fn on<F>(&mut self, channel: ChannelOf<Op>, callback: F) -> &mut Self
    where
        F: FnMut(&Op::Outcome) + Send + 'static,
    {
        self.listeners
            .entry(channel)
            .or_default()
            .push(Box::new(callback));
        self
    }

    /// Register a callback by channel name, e.g. `"USER_NOT_FOUND"`.
    pub fn on_named<F>(&mut self, name: &str, callback: F) -> Result<&mut Self, UndeclaredChannel>
    where
        F: FnMut(&Op::Outcome) + Send + 'static,
    {
        match <ChannelOf<Op> as Channel>::from_name(name) {
            Some(channel) => Ok(self.on(channel, callback)),
            None => Err(UndeclaredChannel {
                operation: self.operation.name(),
                name: name.to_string(),
            }),
        }
    }

    /// Invoke every callback registered for the outcome's channel.
    ///
    /// Returns whether at least one callback existed.
    pub fn emit(&mut self, outcome: &Op::Outcome) -> bool {
        self.log(outcome);

        match self.listeners.get_mut(&outcome.channel()) {
            Some(callbacks) if !callbacks.is_empty() => {
                for callback in callbacks.iter_mut() {
                    callback(outcome);
                }
                true
            }
            _ => false,
        }
    }

    pub fn emit_success(&mut self, payload: <Op::Outcome as Outcome>::Success) -> bool {
        self.emit(&<Op::Outcome as Outcome>::from_success(payload))
    }

    pub fn emit_error(&mut self, error: OperationError) -> bool {
        self.emit(&<Op::Outcome as Outcome>::from_error(error))
    }

    /// Execute the operation once, emit its outcome and return it.
    ///
    /// A panic inside the operation is emitted as `OPERATION_PANICKED` on `ERROR`.
    pub async fn execute(mut self, input: Op::Input) -> Op::Outcome {
        let operation = Arc::clone(&self.operation);
        let span = self.logger.clone().unwrap_or_else(Span::none);

        let outcome = match AssertUnwindSafe(operation.execute(input).instrument(span))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(panic) => <Op::Outcome as Outcome>::from_error(OperationError::new(
                OPERATION_PANICKED,
                format!("{} panicked: {}", operation.name(), panic_message(panic.as_ref())),
            )),
        };

        self.emit(&outcome);
        outcome
    }

    fn log(&self, outcome: &Op::Outcome) {
        let Some(span) = &self.logger else {
            return;
        };
        let _entered = span.enter();
        let operation = self.operation.name();
        let channel = outcome.channel();

        if channel == <ChannelOf<Op> as Channel>::SUCCESS {
            info!(operation, outcome = ?outcome, "Operation succeeded");
        } else if let Some(err) = outcome.error() {
            error!(
                operation,
                code = err.code(),
                error_message = err.message(),
                cause = ?err.details().map(|c| c.to_string()),
                "Operation failed"
            );
        } else {
            debug!(operation, channel = channel.name(), outcome = ?outcome, "Operation emitted");
        }
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics.rsplit("::").next().unwrap_or(without_generics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    crate::outcome! {
        pub enum EchoOutcome via EchoChannel {
            Success(String),
            Empty(String) => "EMPTY",
        }
    }

    struct EchoOperation;

    #[async_trait]
    impl Operation for EchoOperation {
        type Input = String;
        type Outcome = EchoOutcome;

        async fn execute(&self, input: String) -> EchoOutcome {
            match input.as_str() {
                "" => EchoOutcome::Empty("nothing to echo".into()),
                "panic" => panic!("echo exploded"),
                "fail" => EchoOutcome::Error(OperationError::new("ECHO_FAILED", "failed")),
                _ => EchoOutcome::Success(input.clone()),
            }
        }
    }

    fn counter() -> (Arc<AtomicUsize>, impl FnMut(&EchoOutcome) + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move |_: &EchoOutcome| {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(EchoOperation.name(), "EchoOperation");
        assert_eq!(short_type_name("a::b::Create<c::D>"), "Create");
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[tokio::test]
    async fn test_execute_emits_only_the_returned_channel() {
        let (success, on_success) = counter();
        let (empty, on_empty) = counter();
        let (error, on_error) = counter();

        let mut handle = OperationHandle::new(Arc::new(EchoOperation));
        handle
            .on(EchoChannel::Success, on_success)
            .on(EchoChannel::Empty, on_empty)
            .on(EchoChannel::Error, on_error);

        let outcome = handle.execute(String::new()).await;

        assert!(matches!(outcome, EchoOutcome::Empty(_)));
        assert_eq!(success.load(Ordering::SeqCst), 0);
        assert_eq!(empty.load(Ordering::SeqCst), 1);
        assert_eq!(error.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_listeners_run_in_registration_order() {
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let mut handle = OperationHandle::new(Arc::new(EchoOperation));
        for i in 0..3 {
            let order = Arc::clone(&order);
            handle.on(EchoChannel::Success, move |_| order.lock().push(i));
        }

        handle.execute("hi".to_string()).await;
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_panic_becomes_error_outcome() {
        let (error, on_error) = counter();
        let mut handle = OperationHandle::new(Arc::new(EchoOperation));
        handle.on(EchoChannel::Error, on_error);

        let outcome = handle.execute("panic".to_string()).await;

        let err = outcome.error().expect("error outcome");
        assert_eq!(err.code(), OPERATION_PANICKED);
        assert!(err.message().contains("echo exploded"));
        assert_eq!(error.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_on_named_rejects_undeclared_channel() {
        let mut handle = OperationHandle::new(Arc::new(EchoOperation));

        assert!(handle.on_named("EMPTY", |_| {}).is_ok());
        let err = handle.on_named("USER_NOT_FOUND", |_| {}).err().unwrap();
        assert_eq!(err.name, "USER_NOT_FOUND");
        assert_eq!(err.operation, "EchoOperation");
    }

    #[test]
    fn test_emit_reports_whether_listeners_existed() {
        let (count, on_success) = counter();
        let mut handle = OperationHandle::new(Arc::new(EchoOperation))
            .with_logger(tracing::info_span!("test"));

        assert!(!handle.emit_error(OperationError::new("ECHO_FAILED", "no listener")));

        handle.on(EchoChannel::Success, on_success);
        assert!(handle.emit_success("hello".to_string()));
        assert!(handle.emit_success("again".to_string()));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
