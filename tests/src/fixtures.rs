//! Shared wiring for integration flows.

use lot_ledger::prelude::*;
use std::sync::{Arc, Once};

/// Manufacturer of every test lot.
pub const MANUFACTURER: Identity = Identity::new([0x11; 20]);
/// First carrier.
pub const CARRIER: Identity = Identity::new([0x22; 20]);
/// Warehouse operator.
pub const WAREHOUSE: Identity = Identity::new([0x33; 20]);
/// Dispensing pharmacy.
pub const PHARMACY: Identity = Identity::new([0x44; 20]);
/// Data logger travelling with the lot.
pub const LOGGER: Identity = Identity::new([0x55; 20]);
/// Caller with no role in the lot.
pub const STRANGER: Identity = Identity::new([0x66; 20]);

/// Service wired to in-memory adapters.
pub type TestService = LotLedgerService<FixedTimeSource, InMemoryEventBus, RecordingNotifier>;

/// A service together with handles to its adapters.
pub struct Harness {
    /// Service under test.
    pub service: Arc<TestService>,
    /// Controllable clock.
    pub clock: Arc<FixedTimeSource>,
    /// Event bus the service publishes to.
    pub bus: Arc<InMemoryEventBus>,
    /// Captures compromise notifications.
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    /// Wire a service with `config`, starting the clock at `start`.
    pub fn new(config: LedgerConfig, start: Timestamp) -> Self {
        init_telemetry();
        let clock = Arc::new(FixedTimeSource::new(start));
        let bus = Arc::new(InMemoryEventBus::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let service = Arc::new(LotLedgerService::new(
            config,
            clock.clone(),
            bus.clone(),
            notifier.clone(),
        ));
        Self {
            service,
            clock,
            bus,
            notifier,
        }
    }

    /// Move the clock forward.
    pub fn tick(&self, seconds: Timestamp) {
        self.clock.advance(seconds);
    }
}

static TELEMETRY: Once = Once::new();

/// Quiet logging and registered metrics, once per test binary.
pub fn init_telemetry() {
    TELEMETRY.call_once(lot_telemetry::init_test_telemetry);
}
