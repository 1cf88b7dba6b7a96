//! # Lot Ledger
//!
//! Root aggregate of one lot. Every command takes a [`CommandContext`],
//! validates completely, and only then mutates the lot and appends its
//! events. A rejected command changes nothing and emits nothing.

use crate::algorithms::evaluate;
use crate::config::{CompromisedReadingPolicy, LedgerConfig, ReinitializePolicy, ReportingPolicy};
use crate::domain::{
    invariant_lot_id, invariant_monotonic_time, invariant_owner_only, invariant_valid_target,
    Celsius, Envelope,
    Identity, LedgerError, Lot, LotInfo, LotParams, Observation, SensorRegistry,
    TemperatureReading, Timestamp,
};
use crate::events::{EventFilter, EventLog, EventRecord, LedgerEvent};
use lot_telemetry::{
    log_lot_event, metric_inc, HistogramTimer, COMMANDS_REJECTED, CUSTODY_TRANSFERS,
    LOTS_COMPROMISED, LOTS_CREATED, LOTS_REINITIALIZED, READINGS_REGISTERED,
    SENSOR_AUTHORIZATIONS,
};
use tracing::debug;

const COMPONENT: &str = "ledger";

/// Who is acting, and when.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandContext {
    /// Identity asserted by the environment.
    pub caller: Identity,
    /// Command timestamp.
    pub now: Timestamp,
}

impl CommandContext {
    /// Create a context.
    pub fn new(caller: Identity, now: Timestamp) -> Self {
        Self { caller, now }
    }
}

/// Ledger of a single lot.
#[derive(Clone, Debug)]
pub struct LotLedger {
    config: LedgerConfig,
    lot: Option<Lot>,
    events: EventLog,
    last_timestamp: Option<Timestamp>,
}

impl Default for LotLedger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

impl LotLedger {
    /// Create an empty ledger. Call [`LotLedger::create`] before anything else.
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            lot: None,
            events: EventLog::new(),
            last_timestamp: None,
        }
    }

    /// Active policies.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// The lot, once created.
    pub fn lot(&self) -> Option<&Lot> {
        self.lot.as_ref()
    }

    /// Read model of the lot.
    pub fn info(&self) -> Result<LotInfo, LedgerError> {
        Ok(self.require_lot()?.info())
    }

    /// Events matching `filter`, in emission order.
    pub fn events(&self, filter: &EventFilter) -> Vec<EventRecord> {
        self.events.query(filter)
    }

    /// The full event log.
    pub fn event_log(&self) -> &EventLog {
        &self.events
    }

    /// Timestamp of the last committed command.
    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.last_timestamp
    }

    // =========================================================================
    // COMMANDS
    // =========================================================================

    /// Create the lot. The caller becomes manufacturer and first owner.
    pub fn create(
        &mut self,
        ctx: CommandContext,
        params: LotParams,
    ) -> Result<Vec<EventRecord>, LedgerError> {
        self.execute("create", ctx, |ledger| {
            if let Some(existing) = &ledger.lot {
                return Err(LedgerError::AlreadyCreated(existing.lot_id().to_string()));
            }

            invariant_valid_target(ctx.caller)?;
            let lot = Lot::new(params, ctx.caller, ctx.now)?;
            let event = LedgerEvent::LotCreated {
                lot_id: lot.lot_id().to_string(),
                manufacturer: ctx.caller,
                temp_min: lot.envelope().min(),
                temp_max: lot.envelope().max(),
            };

            log_lot_event!(
                info,
                COMPONENT,
                "Lot created",
                lot.lot_id(),
                ctx.caller,
                envelope = %lot.envelope()
            );
            metric_inc!(LOTS_CREATED);

            ledger.lot = Some(lot);
            Ok(vec![event])
        })
    }

    /// Append a temperature reading and evaluate it against the envelope.
    ///
    /// Emits `TemperatureRegistered`, followed by `LotCompromised` when this
    /// reading is the lot's first violation.
    pub fn register_temperature(
        &mut self,
        ctx: CommandContext,
        observation: Observation,
    ) -> Result<Vec<EventRecord>, LedgerError> {
        let config = self.config;
        self.execute("register_temperature", ctx, |ledger| {
            let lot = ledger.require_lot_mut()?;

            match config.reporting {
                ReportingPolicy::Open => {}
                ReportingPolicy::OwnerOnly => invariant_owner_only(ctx.caller, lot.current_owner())?,
                ReportingPolicy::AuthorizedSensors => {
                    if !lot.sensors().is_authorized(&ctx.caller) {
                        return Err(LedgerError::Unauthorized { caller: ctx.caller });
                    }
                }
            }
            if lot.is_compromised() && config.compromised_readings == CompromisedReadingPolicy::Reject {
                return Err(LedgerError::AlreadyCompromised);
            }
            observation.validate()?;

            let violation = evaluate(&observation, &lot.envelope());
            lot.push_reading(TemperatureReading {
                observation,
                reporter: ctx.caller,
                recorded_at: ctx.now,
            });

            let mut events = vec![LedgerEvent::TemperatureRegistered {
                observation,
                reporter: ctx.caller,
            }];

            match violation {
                Some(violation) => {
                    metric_inc!(READINGS_REGISTERED, &["violation"]);
                    if lot.integrity_mut().compromise(violation, ctx.now) {
                        let owner = lot.current_owner();
                        log_lot_event!(
                            warn,
                            COMPONENT,
                            "Lot compromised",
                            lot.lot_id(),
                            ctx.caller,
                            owner = %owner,
                            reason = %violation
                        );
                        metric_inc!(LOTS_COMPROMISED);
                        events.push(LedgerEvent::LotCompromised {
                            owner,
                            observation,
                            reason: violation.to_string(),
                        });
                    }
                }
                None => metric_inc!(READINGS_REGISTERED, &["compliant"]),
            }

            debug!(
                lot_id = %lot.lot_id(),
                observation = %observation,
                readings = lot.temperature_log().len(),
                "Temperature registered"
            );
            Ok(events)
        })
    }

    /// Hand custody to `new_owner`. Current owner only.
    pub fn transfer_custody(
        &mut self,
        ctx: CommandContext,
        new_owner: Identity,
    ) -> Result<Vec<EventRecord>, LedgerError> {
        self.execute("transfer_custody", ctx, |ledger| {
            let lot = ledger.require_lot_mut()?;
            let compromised = lot.is_compromised();
            let change = lot.custody_mut().transfer(ctx.caller, new_owner, ctx.now)?;

            log_lot_event!(
                info,
                COMPONENT,
                "Custody transferred",
                lot.lot_id(),
                ctx.caller,
                to = %change.to,
                stage = ?change.stage,
                compromised
            );
            metric_inc!(CUSTODY_TRANSFERS);

            Ok(vec![LedgerEvent::CustodyTransferred {
                from: change.from,
                to: change.to,
                stage: change.stage,
                compromised,
            }])
        })
    }

    /// Enable or disable a sensor.
    pub fn authorize_sensor(
        &mut self,
        ctx: CommandContext,
        target: Identity,
        enabled: bool,
    ) -> Result<Vec<EventRecord>, LedgerError> {
        let policy = self.config.sensor_admin;
        self.execute("authorize_sensor", ctx, |ledger| {
            let lot = ledger.require_lot_mut()?;
            SensorRegistry::check_admin(policy, ctx.caller, lot.manufacturer(), lot.current_owner())?;
            lot.sensors_mut().set(target, enabled)?;

            log_lot_event!(
                info,
                COMPONENT,
                "Sensor authorization changed",
                lot.lot_id(),
                ctx.caller,
                sensor = %target,
                enabled
            );
            metric_inc!(SENSOR_AUTHORIZATIONS, &[if enabled { "true" } else { "false" }]);

            Ok(vec![LedgerEvent::SensorAuthorizationChanged {
                by: ctx.caller,
                sensor: target,
                enabled,
            }])
        })
    }

    /// Rebind the lot to a new id and envelope.
    ///
    /// Integrity, readings and sensors start over, the caller becomes owner,
    /// and the custody history gains an entry for the caller.
    pub fn reinitialize(
        &mut self,
        ctx: CommandContext,
        new_lot_id: impl Into<String>,
        temp_min: Celsius,
        temp_max: Celsius,
    ) -> Result<Vec<EventRecord>, LedgerError> {
        let policy = self.config.reinitialize;
        let new_lot_id = new_lot_id.into();
        self.execute("reinitialize", ctx, |ledger| {
            let lot = ledger.require_lot_mut()?;
            match policy {
                ReinitializePolicy::Disabled => return Err(LedgerError::ReinitializeDisabled),
                ReinitializePolicy::OwnerOnly => invariant_owner_only(ctx.caller, lot.current_owner())?,
                ReinitializePolicy::LegacyUnrestricted => {}
            }
            // The caller becomes owner
            invariant_valid_target(ctx.caller)?;
            invariant_lot_id(&new_lot_id)?;
            let envelope = Envelope::new(temp_min, temp_max)?;

            let previous_lot_id = lot.lot_id().to_string();
            lot.reset(new_lot_id.clone(), envelope, ctx.caller, ctx.now);

            log_lot_event!(
                warn,
                COMPONENT,
                "Lot reinitialized",
                new_lot_id,
                ctx.caller,
                previous = %previous_lot_id,
                envelope = %envelope
            );
            metric_inc!(LOTS_REINITIALIZED);

            Ok(vec![LedgerEvent::LotReinitialized {
                previous_lot_id,
                lot_id: new_lot_id,
                owner: ctx.caller,
                temp_min,
                temp_max,
            }])
        })
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn execute<F>(
        &mut self,
        command: &'static str,
        ctx: CommandContext,
        op: F,
    ) -> Result<Vec<EventRecord>, LedgerError>
    where
        F: FnOnce(&mut Self) -> Result<Vec<LedgerEvent>, LedgerError>,
    {
        let _timer = HistogramTimer::command(command);
        let result = self.check_time(ctx.now).and_then(|()| op(self));

        match result {
            Ok(events) => {
                self.last_timestamp = Some(ctx.now);
                let lot_id = self.lot.as_ref().map(|lot| lot.lot_id()).unwrap_or_default();
                Ok(self.events.append(lot_id, ctx.now, events).to_vec())
            }
            Err(err) => {
                let lot_id = self.lot.as_ref().map(|lot| lot.lot_id()).unwrap_or_default();
                log_lot_event!(
                    warn,
                    COMPONENT,
                    "Command rejected",
                    lot_id,
                    ctx.caller,
                    command,
                    code = err.code(),
                    error = %err
                );
                metric_inc!(COMMANDS_REJECTED, &[command, err.code()]);
                Err(err)
            }
        }
    }

    fn check_time(&self, now: Timestamp) -> Result<(), LedgerError> {
        match self.last_timestamp {
            Some(last) => invariant_monotonic_time(last, now),
            None => Ok(()),
        }
    }

    fn require_lot(&self) -> Result<&Lot, LedgerError> {
        self.lot.as_ref().ok_or(LedgerError::NotCreated)
    }

    fn require_lot_mut(&mut self) -> Result<&mut Lot, LedgerError> {
        self.lot.as_mut().ok_or(LedgerError::NotCreated)
    }
}
