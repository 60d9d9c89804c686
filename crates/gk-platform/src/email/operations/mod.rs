//! Email Operations

pub mod send_on_forgot_password;
pub mod send_on_user_creation;

pub use send_on_forgot_password::{
    ResetEmailRequest, SendEmailOnForgotPassword, SendEmailOnForgotPasswordChannel,
    SendEmailOnForgotPasswordOutcome,
};
pub use send_on_user_creation::{
    SendEmailOnUserCreation, SendEmailOnUserCreationChannel, SendEmailOnUserCreationOutcome,
};
