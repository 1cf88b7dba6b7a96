//! # Lot Integrity Ledger Test Suite
//!
//! Unified test crate for flows that span more than one component.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Identities, service wiring, telemetry setup
//! └── integration/      # Cross-component choreography
//!     ├── flows.rs      # Service → event bus → notifier
//!     └── cold_chain.rs # Multi-lot journeys and concurrency
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p lot-tests
//!
//! # By category
//! cargo test -p lot-tests integration::flows
//! cargo test -p lot-tests integration::cold_chain
//! ```

pub mod fixtures;
pub mod integration;
