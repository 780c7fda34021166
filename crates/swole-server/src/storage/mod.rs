//! Storage layer
//!
//! A single embedded SQLite file holds the `user` and `workout` tables.

pub mod db;

pub use db::{is_unique_violation, Database};
