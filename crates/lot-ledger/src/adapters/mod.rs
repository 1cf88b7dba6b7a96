//! # Adapters
//!
//! Implementations of the outbound ports.

pub mod clock;
pub mod event_bus;
pub mod notifier;

pub use clock::{FixedTimeSource, SystemTimeSource};
pub use event_bus::{InMemoryEventBus, Subscription, SubscriptionError};
pub use notifier::{RecordingNotifier, TracingNotifier};
