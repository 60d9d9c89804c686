//! Typed Operation Outcomes
//!
//! Every operation declares its output as a closed sum type: one variant per
//! channel, always including `Success` and `Error`. The matching channel enum
//! names the channels so listeners can be registered before the call.
//!
//! Both are generated by [`outcome!`](crate::outcome):
//!
//! ```ignore
//! gk_platform::outcome! {
//!     pub enum LoginOutcome via LoginChannel {
//!         Success(AccessGrant),
//!         UserNotFound(String) => "USER_NOT_FOUND",
//!         InvalidCredentials(String) => "INVALID_CREDENTIALS",
//!     }
//! }
//! ```
//!
//! expands to `LoginOutcome::{Success, UserNotFound, InvalidCredentials, Error}`
//! and `LoginChannel::{Success, UserNotFound, InvalidCredentials, Error}`.

use std::fmt::Debug;
use std::hash::Hash;

use super::error::OperationError;

/// Closed set of output channel names for one operation.
pub trait Channel: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Every declared channel, `SUCCESS` first and `ERROR` last.
    const ALL: &'static [Self];
    const SUCCESS: Self;
    const ERROR: Self;

    /// Wire name, e.g. `"USER_NOT_FOUND"`.
    fn name(self) -> &'static str;

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|channel| channel.name() == name)
    }
}

/// Result of one operation execution. Exactly one channel is populated.
pub trait Outcome: Debug + Send + 'static {
    type Channel: Channel;
    type Success: Debug + Send + 'static;

    fn channel(&self) -> Self::Channel;

    fn from_success(value: Self::Success) -> Self;

    fn from_error(error: OperationError) -> Self;

    /// The error payload when this is the `ERROR` channel.
    fn error(&self) -> Option<&OperationError>;

    fn is_success(&self) -> bool {
        self.channel() == Self::Channel::SUCCESS
    }
}

/// Declare an operation outcome and its channel enum.
///
/// `Success` must come first; an `Error(OperationError)` variant is appended.
#[macro_export]
macro_rules! outcome {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident via $channel:ident {
            Success($success:ty),
            $( $(#[$vmeta:meta])* $variant:ident($payload:ty) => $label:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug)]
        $vis enum $name {
            Success($success),
            $( $(#[$vmeta])* $variant($payload), )*
            Error($crate::usecase::OperationError),
        }

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $channel {
            Success,
            $( $variant, )*
            Error,
        }

        impl $crate::usecase::Channel for $channel {
            const ALL: &'static [Self] = &[
                $channel::Success,
                $( $channel::$variant, )*
                $channel::Error,
            ];
            const SUCCESS: Self = $channel::Success;
            const ERROR: Self = $channel::Error;

            fn name(self) -> &'static str {
                match self {
                    $channel::Success => "SUCCESS",
                    $( $channel::$variant => $label, )*
                    $channel::Error => "ERROR",
                }
            }
        }

        impl $crate::usecase::Outcome for $name {
            type Channel = $channel;
            type Success = $success;

            fn channel(&self) -> $channel {
                match self {
                    $name::Success(_) => $channel::Success,
                    $( $name::$variant(_) => $channel::$variant, )*
                    $name::Error(_) => $channel::Error,
                }
            }

            fn from_success(value: $success) -> Self {
                $name::Success(value)
            }

            fn from_error(error: $crate::usecase::OperationError) -> Self {
                $name::Error(error)
            }

            fn error(&self) -> Option<&$crate::usecase::OperationError> {
                match self {
                    $name::Error(error) => Some(error),
                    _ => None,
                }
            }
        }
    };
}
