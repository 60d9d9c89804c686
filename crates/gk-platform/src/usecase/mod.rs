//! Use Case Infrastructure
//!
//! Provides the foundational patterns for implementing use cases:
//! - `Operation` / `OperationHandle` - single-shot use cases with typed output channels
//! - `Outcome` / `Channel` - per-operation outcome sum types, see [`outcome!`](crate::outcome)
//! - `OperationError` - code, message and cause of unexpected failures
//! - `DomainEvent` - closed set of in-process domain events
//! - `EventBus` - publish/subscribe with a one-time installed registry
//! - `Bootstrap` - startup hook through which subscriber operations register

pub mod bootstrap;
pub mod domain_event;
pub mod error;
pub mod event_bus;
pub mod operation;
pub mod outcome;

pub use bootstrap::{Bootstrap, InputExtractor, OperationSubscriber};
pub use domain_event::{DomainEvent, DomainEventKind, EventEnvelope};
pub use error::{OperationError, ValidationFailure, OPERATION_PANICKED};
pub use event_bus::{BusError, EventBus, EventHandler, Subscriptions};
pub use operation::{Operation, OperationHandle, UndeclaredChannel};
pub use outcome::{Channel, Outcome};
