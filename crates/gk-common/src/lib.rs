//! Gatekeeper Common
//!
//! Small building blocks shared by every crate in the workspace:
//! - `logging` - tracing subscriber setup (text or JSON)
//! - `Secret` - string wrapper that never prints its contents

pub mod logging;
pub mod secret;

pub use logging::{init_logging, LogFormat};
pub use secret::Secret;
