//! Lot Ledger Service - hosts many lots
//!
//! Each lot is an independent [`LotLedger`] behind its own mutex. A command
//! locks exactly one lot; the outer map is only write-locked to add a lot or
//! to re-key one on reinitialization. Events are published and compromise
//! notifications sent after the lot lock is released.
//!
//! Publication is per-lot ordered: whoever dispatches first flushes every
//! committed record the bus has not seen yet, in sequence order, so
//! subscribers never observe a lot's records out of order.

use crate::config::LedgerConfig;
use crate::domain::{
    Celsius, CustodyRecord, Identity, LedgerError, LotInfo, LotParams, Observation,
    TemperatureReading, Timestamp,
};
use crate::events::{EventFilter, EventKind, EventRecord};
use crate::ledger::{CommandContext, LotLedger};
use crate::ports::{CompromiseNotifier, EventPublisher, LotLedgerApi, TimeSource};
use async_trait::async_trait;
use lot_telemetry::{
    log_event, lot_span, metric_inc, COMMANDS_REJECTED, LOTS_HOSTED, NOTIFICATION_FAILURES,
};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, Instrument};

const COMPONENT: &str = "service";

/// One hosted lot.
struct LotSlot {
    ledger: Mutex<LotLedger>,
    /// Sequence of the last record handed to the publisher.
    published: AsyncMutex<u64>,
}

impl LotSlot {
    fn new(ledger: LotLedger) -> Self {
        Self {
            ledger: Mutex::new(ledger),
            published: AsyncMutex::new(0),
        }
    }
}

type SharedLot = Arc<LotSlot>;

/// Outcome of a command, captured while the lot was locked.
struct Committed {
    slot: SharedLot,
    records: Vec<EventRecord>,
    /// Post-command snapshot when the command compromised the lot.
    compromised: Option<LotInfo>,
}

/// Lot Ledger Service implementation
pub struct LotLedgerService<T, P, N>
where
    T: TimeSource,
    P: EventPublisher,
    N: CompromiseNotifier,
{
    config: LedgerConfig,
    lots: RwLock<HashMap<String, SharedLot>>,
    clock: Arc<T>,
    publisher: Arc<P>,
    notifier: Arc<N>,
}

impl<T, P, N> LotLedgerService<T, P, N>
where
    T: TimeSource,
    P: EventPublisher,
    N: CompromiseNotifier,
{
    /// Create a service. Every hosted lot uses `config`.
    pub fn new(config: LedgerConfig, clock: Arc<T>, publisher: Arc<P>, notifier: Arc<N>) -> Self {
        Self {
            config,
            lots: RwLock::new(HashMap::new()),
            clock,
            publisher,
            notifier,
        }
    }

    /// Policies applied to every hosted lot.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Number of hosted lots.
    pub fn len(&self) -> usize {
        self.lots.read().len()
    }

    /// Whether no lot is hosted.
    pub fn is_empty(&self) -> bool {
        self.lots.read().is_empty()
    }

    fn slot(&self, lot_id: &str) -> Result<SharedLot, LedgerError> {
        self.lots
            .read()
            .get(lot_id)
            .cloned()
            .ok_or_else(|| LedgerError::LotNotFound(lot_id.to_string()))
    }

    /// Lock a slot looked up as `lot_id`.
    ///
    /// The map lock is released before the lot lock is taken, so the lot may
    /// have been re-keyed in between; it then no longer answers to `lot_id`.
    fn lock_named<'a>(
        slot: &'a LotSlot,
        lot_id: &str,
    ) -> Result<MutexGuard<'a, LotLedger>, LedgerError> {
        let guard = slot.ledger.lock();
        if guard.lot().map(|lot| lot.lot_id()) != Some(lot_id) {
            return Err(LedgerError::LotNotFound(lot_id.to_string()));
        }
        Ok(guard)
    }

    fn reject(command: &'static str, err: LedgerError) -> LedgerError {
        log_event!(
            warn,
            COMPONENT,
            "Command rejected by service",
            command,
            code = err.code(),
            error = %err
        );
        metric_inc!(COMMANDS_REJECTED, &[command, err.code()]);
        err
    }

    /// Run `op` on one locked lot, stamping it with the current time.
    fn apply<F>(&self, command: &'static str, lot_id: &str, op: F) -> Result<Committed, LedgerError>
    where
        F: FnOnce(&mut LotLedger, Timestamp) -> Result<Vec<EventRecord>, LedgerError>,
    {
        let slot = self.slot(lot_id).map_err(|e| Self::reject(command, e))?;
        self.apply_to(slot, command, lot_id, op)
    }

    fn apply_to<F>(
        &self,
        slot: SharedLot,
        command: &'static str,
        lot_id: &str,
        op: F,
    ) -> Result<Committed, LedgerError>
    where
        F: FnOnce(&mut LotLedger, Timestamp) -> Result<Vec<EventRecord>, LedgerError>,
    {
        let mut guard = Self::lock_named(&slot, lot_id).map_err(|e| Self::reject(command, e))?;
        let records = op(&mut *guard, self.clock.now())?;
        let compromised = Self::capture(&*guard, &records)?;
        drop(guard);
        Ok(Committed {
            slot,
            records,
            compromised,
        })
    }

    fn capture(ledger: &LotLedger, records: &[EventRecord]) -> Result<Option<LotInfo>, LedgerError> {
        if records.iter().any(|r| r.kind() == EventKind::LotCompromised) {
            Ok(Some(ledger.info()?))
        } else {
            Ok(None)
        }
    }

    fn insert_new(&self, caller: Identity, params: LotParams) -> Result<Committed, LedgerError> {
        let mut lots = self.lots.write();
        if lots.contains_key(&params.lot_id) {
            return Err(Self::reject(
                "create",
                LedgerError::AlreadyCreated(params.lot_id),
            ));
        }

        let lot_id = params.lot_id.clone();
        let mut ledger = LotLedger::new(self.config);
        let records = ledger.create(CommandContext::new(caller, self.clock.now()), params)?;
        let slot = Arc::new(LotSlot::new(ledger));
        lots.insert(lot_id, Arc::clone(&slot));
        LOTS_HOSTED.set(lots.len() as f64);

        Ok(Committed {
            slot,
            records,
            compromised: None,
        })
    }

    fn rekey(
        &self,
        lot_id: &str,
        caller: Identity,
        new_lot_id: &str,
        temp_min: Celsius,
        temp_max: Celsius,
    ) -> Result<Committed, LedgerError> {
        let mut lots = self.lots.write();
        let slot = lots
            .get(lot_id)
            .cloned()
            .ok_or_else(|| Self::reject("reinitialize", LedgerError::LotNotFound(lot_id.to_string())))?;
        if new_lot_id != lot_id && lots.contains_key(new_lot_id) {
            return Err(Self::reject(
                "reinitialize",
                LedgerError::AlreadyCreated(new_lot_id.to_string()),
            ));
        }

        let records = {
            let mut guard = slot.ledger.lock();
            let ctx = CommandContext::new(caller, self.clock.now());
            guard.reinitialize(ctx, new_lot_id, temp_min, temp_max)?
        };

        if new_lot_id != lot_id {
            lots.remove(lot_id);
            lots.insert(new_lot_id.to_string(), Arc::clone(&slot));
            debug!(from = %lot_id, to = %new_lot_id, "Lot re-keyed");
        }

        Ok(Committed {
            slot,
            records,
            compromised: None,
        })
    }

    /// Publish every record of the lot not yet published, then deliver the
    /// compromise notification, if any.
    async fn dispatch(&self, committed: Committed) -> Vec<EventRecord> {
        let Committed {
            slot,
            records,
            compromised,
        } = committed;

        {
            let mut cursor = slot.published.lock().await;
            let pending: Vec<EventRecord> = slot
                .ledger
                .lock()
                .event_log()
                .records()
                .get(*cursor as usize..)
                .map(<[EventRecord]>::to_vec)
                .unwrap_or_default();
            for record in pending {
                *cursor = record.sequence;
                self.publisher.publish(record).await;
            }
        }

        if let Some(info) = compromised {
            if let Err(e) = self.notifier.notify(&info).await {
                log_event!(
                    warn,
                    COMPONENT,
                    "Compromise notification failed",
                    lot_id = %info.lot_id,
                    error = %e
                );
                metric_inc!(NOTIFICATION_FAILURES);
            }
        }

        records
    }

    fn read<R>(&self, lot_id: &str, f: impl FnOnce(&LotLedger) -> Result<R, LedgerError>) -> Result<R, LedgerError> {
        let slot = self.slot(lot_id)?;
        Self::read_from(&slot, lot_id, f)
    }

    fn read_from<R>(
        slot: &LotSlot,
        lot_id: &str,
        f: impl FnOnce(&LotLedger) -> Result<R, LedgerError>,
    ) -> Result<R, LedgerError> {
        let guard = Self::lock_named(slot, lot_id)?;
        f(&*guard)
    }
}

#[async_trait]
impl<T, P, N> LotLedgerApi for LotLedgerService<T, P, N>
where
    T: TimeSource + 'static,
    P: EventPublisher + 'static,
    N: CompromiseNotifier + 'static,
{
    async fn create_lot(
        &self,
        caller: Identity,
        params: LotParams,
    ) -> Result<Vec<EventRecord>, LedgerError> {
        let span = lot_span!("create_lot", params.lot_id);
        async {
            let committed = self.insert_new(caller, params)?;
            Ok::<_, LedgerError>(self.dispatch(committed).await)
        }
        .instrument(span)
        .await
    }

    async fn register_temperature(
        &self,
        lot_id: &str,
        caller: Identity,
        observation: Observation,
    ) -> Result<Vec<EventRecord>, LedgerError> {
        async {
            let committed = self.apply("register_temperature", lot_id, |ledger, now| {
                ledger.register_temperature(CommandContext::new(caller, now), observation)
            })?;
            Ok::<_, LedgerError>(self.dispatch(committed).await)
        }
        .instrument(lot_span!("register_temperature", lot_id))
        .await
    }

    async fn transfer_custody(
        &self,
        lot_id: &str,
        caller: Identity,
        new_owner: Identity,
    ) -> Result<Vec<EventRecord>, LedgerError> {
        async {
            let committed = self.apply("transfer_custody", lot_id, |ledger, now| {
                ledger.transfer_custody(CommandContext::new(caller, now), new_owner)
            })?;
            Ok::<_, LedgerError>(self.dispatch(committed).await)
        }
        .instrument(lot_span!("transfer_custody", lot_id))
        .await
    }

    async fn authorize_sensor(
        &self,
        lot_id: &str,
        caller: Identity,
        target: Identity,
        enabled: bool,
    ) -> Result<Vec<EventRecord>, LedgerError> {
        async {
            let committed = self.apply("authorize_sensor", lot_id, |ledger, now| {
                ledger.authorize_sensor(CommandContext::new(caller, now), target, enabled)
            })?;
            Ok::<_, LedgerError>(self.dispatch(committed).await)
        }
        .instrument(lot_span!("authorize_sensor", lot_id))
        .await
    }

    async fn reinitialize(
        &self,
        lot_id: &str,
        caller: Identity,
        new_lot_id: &str,
        temp_min: Celsius,
        temp_max: Celsius,
    ) -> Result<Vec<EventRecord>, LedgerError> {
        async {
            let committed = self.rekey(lot_id, caller, new_lot_id, temp_min, temp_max)?;
            Ok::<_, LedgerError>(self.dispatch(committed).await)
        }
        .instrument(lot_span!("reinitialize", lot_id))
        .await
    }

    async fn lot_info(&self, lot_id: &str) -> Result<LotInfo, LedgerError> {
        self.read(lot_id, LotLedger::info)
    }

    async fn custody_history(&self, lot_id: &str) -> Result<Vec<CustodyRecord>, LedgerError> {
        self.read(lot_id, |ledger| {
            ledger
                .lot()
                .map(|lot| lot.custody_log().to_vec())
                .ok_or(LedgerError::NotCreated)
        })
    }

    async fn temperature_history(
        &self,
        lot_id: &str,
    ) -> Result<Vec<TemperatureReading>, LedgerError> {
        self.read(lot_id, |ledger| {
            ledger
                .lot()
                .map(|lot| lot.temperature_log().to_vec())
                .ok_or(LedgerError::NotCreated)
        })
    }

    async fn events(
        &self,
        lot_id: &str,
        filter: EventFilter,
    ) -> Result<Vec<EventRecord>, LedgerError> {
        self.read(lot_id, |ledger| Ok(ledger.events(&filter)))
    }

    async fn lot_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lots.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}
