//! Swole Types - wire types shared by the server and its clients
//!
//! Plain serde data with no async runtime or database dependencies.

pub mod message;
pub mod user;
pub mod workout;

pub use user::*;
pub use workout::*;

use thiserror::Error;

/// A required body field was absent or null
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Error: {0} is required")]
pub struct MissingField(pub &'static str);

/// Unwrap an optional request field or name it as missing
pub(crate) fn require<T>(value: Option<T>, field: &'static str) -> Result<T, MissingField> {
    value.ok_or(MissingField(field))
}
