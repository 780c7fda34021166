//! HTTP handlers

pub mod health;
pub mod users;
pub mod workouts;

pub use health::health;
