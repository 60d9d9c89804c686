//! Shared infrastructure: errors, identifiers, indexes.

pub mod error;
pub mod indexes;
pub mod tsid;

pub use error::{PlatformError, Result};
pub use tsid::TsidGenerator;
