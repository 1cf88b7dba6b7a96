//! # Cold Chain Journeys
//!
//! End-to-end lot journeys through the service, covering every deployment
//! profile:
//!
//! | Profile | Reporter | After compromise | Reinitialize |
//! |---------|----------|------------------|--------------|
//! | `sensor_gated` | authorized logger | readings rejected | disabled |
//! | `owner_reported` | custody holder | readings recorded | disabled |
//! | `proof_of_concept` | anyone | readings recorded | anyone |
//!
//! Also checks that concurrent handlers on one lot keep the event log dense.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use lot_ledger::prelude::*;
    use std::sync::Arc;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const LOT: &str = "LOT-2024-117";

    async fn create(harness: &Harness, lot_id: &str) {
        harness
            .service
            .create_lot(MANUFACTURER, LotParams::new(lot_id, 2, 8))
            .await
            .expect("create lot");
    }

    fn stages(records: &[EventRecord]) -> Vec<LifecycleStage> {
        records
            .iter()
            .filter_map(|r| match r.event {
                LedgerEvent::CustodyTransferred { stage, .. } => Some(stage),
                _ => None,
            })
            .collect()
    }

    // =============================================================================
    // INTEGRATION TESTS: FULL JOURNEYS
    // =============================================================================

    /// Manufacturer → carrier → warehouse → pharmacy with an attached logger.
    #[tokio::test]
    async fn test_sensor_gated_journey_to_pharmacy() {
        let harness = Harness::new(LedgerConfig::sensor_gated(), 1_700_000_000);
        create(&harness, LOT).await;
        let service = &harness.service;
        service
            .authorize_sensor(LOT, MANUFACTURER, LOGGER, true)
            .await
            .unwrap();

        let mut holder = MANUFACTURER;
        for next in [CARRIER, WAREHOUSE, PHARMACY] {
            for value in [3, 4, 6] {
                harness.tick(900);
                service
                    .register_temperature(LOT, LOGGER, Observation::Point(value))
                    .await
                    .unwrap();
            }
            harness.tick(60);
            service.transfer_custody(LOT, holder, next).await.unwrap();
            holder = next;
        }

        let info = service.lot_info(LOT).await.unwrap();
        assert_eq!(info.current_owner, PHARMACY);
        assert_eq!(info.stage, LifecycleStage::Delivered);
        assert!(!info.compromised);
        assert_eq!(info.readings, 9);

        let owners: Vec<Identity> = service
            .custody_history(LOT)
            .await
            .unwrap()
            .iter()
            .map(|record| record.owner)
            .collect();
        assert_eq!(owners, vec![MANUFACTURER, CARRIER, WAREHOUSE, PHARMACY]);

        let transfers = service
            .events(LOT, EventFilter::kinds(vec![EventKind::CustodyTransferred]))
            .await
            .unwrap();
        assert_eq!(
            stages(&transfers),
            vec![
                LifecycleStage::InTransit,
                LifecycleStage::InWarehouse,
                LifecycleStage::Delivered
            ]
        );

        // Only the manufacturer administers sensors in this profile
        assert!(service
            .authorize_sensor(LOT, PHARMACY, STRANGER, true)
            .await
            .unwrap_err()
            .is_access_denied());
    }

    /// Delivered is terminal; further handoffs keep the stage.
    #[tokio::test]
    async fn test_delivered_lot_keeps_stage() {
        let harness = Harness::new(LedgerConfig::proof_of_concept(), 1_700_000_000);
        create(&harness, LOT).await;
        let service = &harness.service;

        let mut holder = MANUFACTURER;
        for next in [CARRIER, WAREHOUSE, PHARMACY, STRANGER] {
            service.transfer_custody(LOT, holder, next).await.unwrap();
            holder = next;
        }

        let info = service.lot_info(LOT).await.unwrap();
        assert_eq!(info.stage, LifecycleStage::Delivered);
        assert_eq!(info.custody_entries, 5);
    }

    /// The custody holder reports; handing the lot over hands over reporting.
    #[tokio::test]
    async fn test_owner_reported_handoff() {
        let harness = Harness::new(LedgerConfig::owner_reported(), 1_700_000_000);
        create(&harness, LOT).await;
        let service = &harness.service;

        service
            .register_temperature(LOT, MANUFACTURER, Observation::Point(5))
            .await
            .unwrap();
        service
            .transfer_custody(LOT, MANUFACTURER, CARRIER)
            .await
            .unwrap();

        assert!(matches!(
            service
                .register_temperature(LOT, MANUFACTURER, Observation::Point(5))
                .await,
            Err(LedgerError::NotOwner { .. })
        ));
        service
            .register_temperature(LOT, CARRIER, Observation::Point(11))
            .await
            .unwrap();

        // Compromised lots keep recording under the default policy
        service
            .register_temperature(LOT, CARRIER, Observation::Point(5))
            .await
            .unwrap();

        let history = service.temperature_history(LOT).await.unwrap();
        let reporters: Vec<Identity> = history.iter().map(|r| r.reporter).collect();
        assert_eq!(reporters, vec![MANUFACTURER, CARRIER, CARRIER]);
        assert!(service.lot_info(LOT).await.unwrap().compromised);
        assert_eq!(harness.notifier.count(), 1);
    }

    // =============================================================================
    // INTEGRATION TESTS: REINITIALIZATION
    // =============================================================================

    /// A compromised lot is recovered under a new identifier.
    #[tokio::test]
    async fn test_reinitialize_recovers_compromised_lot() {
        let harness = Harness::new(LedgerConfig::proof_of_concept(), 1_700_000_000);
        create(&harness, LOT).await;
        let mut resets = harness
            .bus
            .subscribe(EventFilter::kinds(vec![EventKind::LotReinitialized]));
        let service = &harness.service;

        service
            .register_temperature(LOT, STRANGER, Observation::Point(14))
            .await
            .unwrap();
        assert_eq!(harness.notifier.count(), 1);

        harness.tick(600);
        service
            .reinitialize(LOT, STRANGER, "LOT-2024-117R", 15, 25)
            .await
            .unwrap();

        assert_eq!(
            service.lot_info(LOT).await,
            Err(LedgerError::LotNotFound(LOT.into()))
        );
        assert_eq!(service.lot_ids().await, vec!["LOT-2024-117R".to_string()]);

        let info = service.lot_info("LOT-2024-117R").await.unwrap();
        assert!(!info.compromised);
        assert_eq!(info.current_owner, STRANGER);
        assert_eq!(info.manufacturer, MANUFACTURER);
        assert_eq!((info.temp_min, info.temp_max), (15, 25));
        assert_eq!(info.stage, LifecycleStage::Created);

        let reset = resets.drain();
        assert_eq!(reset.len(), 1);
        assert_eq!(reset[0].lot_id, "LOT-2024-117R");
        match &reset[0].event {
            LedgerEvent::LotReinitialized {
                previous_lot_id,
                owner,
                ..
            } => {
                assert_eq!(previous_lot_id, LOT);
                assert_eq!(*owner, STRANGER);
            }
            other => panic!("Expected LotReinitialized, got {:?}", other),
        }

        // The recovered lot can be compromised again
        service
            .register_temperature("LOT-2024-117R", STRANGER, Observation::Point(30))
            .await
            .unwrap();
        assert_eq!(harness.notifier.count(), 2);

        // History carries across the reset
        let log = service
            .events("LOT-2024-117R", EventFilter::all())
            .await
            .unwrap();
        let sequences: Vec<u64> = log.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, (1..=log.len() as u64).collect::<Vec<_>>());
        assert_eq!(log[0].kind(), EventKind::LotCreated);
    }

    /// Owner-gated reinitialization refuses everyone but the holder.
    #[tokio::test]
    async fn test_owner_only_reinitialize() {
        let config = LedgerConfig {
            reinitialize: ReinitializePolicy::OwnerOnly,
            ..LedgerConfig::proof_of_concept()
        };
        let harness = Harness::new(config, 1_700_000_000);
        create(&harness, LOT).await;
        let service = &harness.service;
        service
            .transfer_custody(LOT, MANUFACTURER, CARRIER)
            .await
            .unwrap();

        assert!(matches!(
            service.reinitialize(LOT, MANUFACTURER, "LOT-B", 0, 4).await,
            Err(LedgerError::NotOwner { .. })
        ));
        assert_eq!(
            service.reinitialize(LOT, CARRIER, "", 0, 4).await,
            Err(LedgerError::EmptyLotId)
        );
        assert!(matches!(
            service.reinitialize(LOT, CARRIER, "LOT-B", 9, 4).await,
            Err(LedgerError::InvalidEnvelope { .. })
        ));
        assert_eq!(service.lot_ids().await, vec![LOT.to_string()]);

        service
            .reinitialize(LOT, CARRIER, "LOT-B", 0, 4)
            .await
            .unwrap();
        assert_eq!(service.lot_ids().await, vec!["LOT-B".to_string()]);
    }

    // =============================================================================
    // INTEGRATION TESTS: CONCURRENCY
    // =============================================================================

    /// Handlers racing on one lot never lose, duplicate, or reorder a record.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_handlers_on_one_lot() {
        let harness = Harness::new(LedgerConfig::proof_of_concept(), 1_700_000_000);
        create(&harness, LOT).await;
        let mut sub = harness.bus.subscribe_lot(LOT, EventFilter::all());

        let mut handles = Vec::new();
        for reporter in [CARRIER, WAREHOUSE, PHARMACY, LOGGER] {
            let service = Arc::clone(&harness.service);
            handles.push(tokio::spawn(async move {
                for _ in 0..20 {
                    service
                        .register_temperature(LOT, reporter, Observation::Range { min: 3, max: 7 })
                        .await
                        .expect("reading accepted");
                }
            }));
        }
        for handle in handles {
            handle.await.expect("handler task");
        }

        let log = harness
            .service
            .events(LOT, EventFilter::all())
            .await
            .unwrap();
        assert_eq!(log.len(), 81);
        let sequences: Vec<u64> = log.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, (1..=81).collect::<Vec<u64>>());

        // Subscribed after creation: every reading, in commit order
        let published: Vec<u64> = sub.drain().iter().map(|r| r.sequence).collect();
        assert_eq!(published, (2..=81).collect::<Vec<u64>>());
        assert_eq!(harness.service.lot_info(LOT).await.unwrap().readings, 80);
    }
}
