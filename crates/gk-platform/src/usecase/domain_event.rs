//! Domain Events
//!
//! Facts published by operations (past tense) and consumed by subscriber
//! operations through the [`EventBus`](super::EventBus). The set of events is
//! closed; each kind carries a fixed payload.
//!
//! Events live only in memory. They are never stored and never replayed.
//!
//! # Event Type Format
//!
//! `{app}:{domain}:{aggregate}:{action}`, e.g. `gatekeeper:iam:user:created`.

use chrono::{DateTime, Utc};

use crate::shared::tsid::TsidGenerator;
use crate::token::entity::Token;
use crate::user::entity::User;

/// Something that happened in the domain.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A new account was stored.
    UserCreated { user: User },
    /// An account was removed.
    UserDeleted { user_id: String },
    /// A verification token was issued for `user`.
    TokenCreated { user: User },
    /// `user` asked for a password reset and `token` was issued.
    ForgotPassword { user: User, token: Token },
}

/// Identity of a [`DomainEvent`]; the subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainEventKind {
    UserCreated,
    UserDeleted,
    TokenCreated,
    ForgotPassword,
}

impl DomainEventKind {
    pub const ALL: [DomainEventKind; 4] = [
        Self::UserCreated,
        Self::UserDeleted,
        Self::TokenCreated,
        Self::ForgotPassword,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::UserCreated => "UserCreated",
            Self::UserDeleted => "UserDeleted",
            Self::TokenCreated => "TokenCreated",
            Self::ForgotPassword => "ForgotPassword",
        }
    }

    pub fn event_type(self) -> &'static str {
        match self {
            Self::UserCreated => "gatekeeper:iam:user:created",
            Self::UserDeleted => "gatekeeper:iam:user:deleted",
            Self::TokenCreated => "gatekeeper:iam:token:created",
            Self::ForgotPassword => "gatekeeper:iam:password:reset-requested",
        }
    }
}

impl DomainEvent {
    pub fn kind(&self) -> DomainEventKind {
        match self {
            Self::UserCreated { .. } => DomainEventKind::UserCreated,
            Self::UserDeleted { .. } => DomainEventKind::UserDeleted,
            Self::TokenCreated { .. } => DomainEventKind::TokenCreated,
            Self::ForgotPassword { .. } => DomainEventKind::ForgotPassword,
        }
    }

    /// Id of the user the event is about.
    pub fn subject(&self) -> &str {
        match self {
            Self::UserCreated { user }
            | Self::TokenCreated { user }
            | Self::ForgotPassword { user, .. } => &user.id,
            Self::UserDeleted { user_id } => user_id,
        }
    }
}

/// One publication of an event. The id and timestamp are for log correlation.
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub id: String,
    pub occurred_at: DateTime<Utc>,
    pub event: DomainEvent,
}

impl EventEnvelope {
    pub fn new(event: DomainEvent) -> Self {
        Self {
            id: TsidGenerator::generate(),
            occurred_at: Utc::now(),
            event,
        }
    }

    pub fn kind(&self) -> DomainEventKind {
        self.event.kind()
    }
}
