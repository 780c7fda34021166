//! Request extractors

pub mod json;
pub mod path;

pub use json::JsonBody;
pub use path::PathId;
