//! # Ports
//!
//! Hexagonal architecture boundaries.
//!
//! - **Inbound (driving)**: [`LotLedgerApi`], the command and query surface.
//! - **Outbound (driven)**: [`TimeSource`], [`EventPublisher`], and
//!   [`CompromiseNotifier`].

pub mod inbound;
pub mod outbound;

pub use inbound::LotLedgerApi;
pub use outbound::{CompromiseNotifier, EventPublisher, NotifyError, TimeSource};
