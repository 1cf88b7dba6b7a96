//! # Lot Integrity Ledger
//!
//! Tamper-evident record of a pharmaceutical lot's journey: who holds it,
//! which sensors may report its temperature, and whether it ever left its
//! accepted temperature envelope.
//!
//! ## Purpose
//!
//! A manufacturer creates a lot with an envelope `[temp_min, temp_max]`.
//! Custody passes from holder to holder; each handoff is appended to the
//! custody history and advances the lifecycle stage. Readings are appended
//! to the temperature log; the first reading outside the envelope marks the
//! lot compromised, permanently.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Last custody entry names the current owner | `domain/custody.rs` - `transfer()` / `restart()` |
//! | Compromise is one-way (except reinitialize) | `domain/value_objects.rs` - `IntegrityState::compromise()` |
//! | `temp_min <= temp_max` | `domain/value_objects.rs` - `Envelope::new()` |
//! | Failed commands change nothing | `ledger.rs` - validate before mutate |
//! | Command time never goes backwards | `domain/invariants.rs` - `invariant_monotonic_time()` |
//!
//! ## Lifecycle
//!
//! ```text
//! [Created] ──transfer──→ [InTransit] ──transfer──→ [InWarehouse] ──transfer──→ [Delivered]
//!                                                                                  │  ↑
//!                                                                                  └──┘ transfer
//! ```
//!
//! ## Policies
//!
//! | Policy | Choices | Default |
//! |--------|---------|---------|
//! | `ReportingPolicy` | Open, OwnerOnly, AuthorizedSensors | AuthorizedSensors |
//! | `CompromisedReadingPolicy` | Record, Reject | Record |
//! | `SensorAdminPolicy` | ManufacturerOnly, ManufacturerOrOwner | ManufacturerOrOwner |
//! | `ReinitializePolicy` | Disabled, OwnerOnly, LegacyUnrestricted | Disabled |
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      OUTER LAYER                                │
//! │  adapters/ - clock, in-memory event bus, notifiers              │
//! │  service.rs - LotLedgerService (many lots, per-lot locking)     │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MIDDLE LAYER                               │
//! │  ports/inbound.rs  - LotLedgerApi trait                         │
//! │  ports/outbound.rs - TimeSource, EventPublisher,                │
//! │                      CompromiseNotifier traits                  │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      INNER LAYER                                │
//! │  ledger.rs             - LotLedger root aggregate commands      │
//! │  events.rs             - LedgerEvent, EventRecord, EventLog     │
//! │  algorithms/           - envelope compliance                    │
//! │  domain/custody.rs     - CustodyTracker                         │
//! │  domain/sensors.rs     - SensorRegistry                         │
//! │  domain/entities.rs    - Lot, LotInfo, TemperatureReading       │
//! │  domain/errors.rs      - LedgerError enum                       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lot_ledger::prelude::*;
//!
//! let mut ledger = LotLedger::new(LedgerConfig::proof_of_concept());
//! ledger.create(CommandContext::new(mfr, 100), LotParams::new("LOT-1", 2, 8))?;
//! ledger.register_temperature(CommandContext::new(sensor, 110), Observation::Point(9))?;
//! assert!(ledger.lot().unwrap().is_compromised());
//! ```

#![warn(missing_docs)]

pub mod adapters;
pub mod algorithms;
pub mod config;
pub mod domain;
pub mod events;
pub mod ledger;
pub mod ports;
pub mod service;

pub use adapters::*;
pub use config::*;
pub use domain::*;
pub use events::*;
pub use ledger::{CommandContext, LotLedger};
pub use ports::*;
pub use service::LotLedgerService;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commonly used items.
pub mod prelude {
    pub use crate::adapters::{
        FixedTimeSource, InMemoryEventBus, RecordingNotifier, SystemTimeSource, TracingNotifier,
    };
    pub use crate::config::{
        CompromisedReadingPolicy, LedgerConfig, ReinitializePolicy, ReportingPolicy,
        SensorAdminPolicy,
    };
    pub use crate::domain::{
        Celsius, CustodyRecord, ErrorKind, Identity, LedgerError, LifecycleStage, LotInfo,
        LotParams, Observation, TemperatureReading, Timestamp,
    };
    pub use crate::events::{EventFilter, EventKind, EventRecord, LedgerEvent};
    pub use crate::ledger::{CommandContext, LotLedger};
    pub use crate::ports::{CompromiseNotifier, EventPublisher, LotLedgerApi, TimeSource};
    pub use crate::service::LotLedgerService;
}
