//! Email
//!
//! Outgoing messages are rendered by `templates` and handed to an
//! `EmailSender`. The operations that send them react to domain events.

pub mod operations;
pub mod sender;
pub mod templates;

pub use sender::{EmailMessage, EmailSender, LogEmailSender, RecordingEmailSender};
pub use templates::EmailTemplates;
