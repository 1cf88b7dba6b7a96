//! # Domain Module
//!
//! Core domain types for the Lot Integrity Ledger.

pub mod custody;
pub mod entities;
pub mod errors;
pub mod invariants;
pub mod sensors;
pub mod value_objects;

pub use custody::{CustodyChange, CustodyRecord, CustodyTracker};
pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use sensors::SensorRegistry;
pub use value_objects::*;
