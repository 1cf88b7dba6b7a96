//! # Algorithms Module
//!
//! Pure compliance evaluation over observations and envelopes.

pub mod compliance;

pub use compliance::{evaluate, evaluate_point, evaluate_range};
