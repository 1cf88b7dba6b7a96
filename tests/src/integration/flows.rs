//! # Service → Bus → Notifier Flows
//!
//! Verifies the choreography between the ledger service and its driven
//! adapters:
//!
//! ```text
//! Caller ──command──→ LotLedgerService ──commit──→ per-lot EventLog
//!                            │
//!                            ├──publish──→ InMemoryEventBus ──→ subscribers
//!                            └──notify───→ CompromiseNotifier (first compromise only)
//! ```
//!
//! Rejected commands must leave the bus and the notifier untouched.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use lot_ledger::prelude::*;
    use std::time::Duration;
    use tokio::time::timeout;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const LOT: &str = "LOT-2024-001";

    async fn sensor_gated_lot() -> Harness {
        let harness = Harness::new(LedgerConfig::sensor_gated(), 1_700_000_000);
        harness
            .service
            .create_lot(MANUFACTURER, LotParams::new(LOT, 2, 8))
            .await
            .expect("create lot");
        harness.tick(10);
        harness
            .service
            .authorize_sensor(LOT, MANUFACTURER, LOGGER, true)
            .await
            .expect("authorize logger");
        harness
    }

    // =============================================================================
    // INTEGRATION TESTS: EVENT DELIVERY
    // =============================================================================

    /// A lot-scoped subscriber sees readings of its lot as they commit.
    #[tokio::test]
    async fn test_logger_readings_reach_lot_subscriber() {
        let harness = sensor_gated_lot().await;
        let mut sub = harness.bus.subscribe_lot(
            LOT,
            EventFilter::kinds(vec![EventKind::TemperatureRegistered]),
        );

        for value in [3, 5, 7] {
            harness.tick(60);
            harness
                .service
                .register_temperature(LOT, LOGGER, Observation::Point(value))
                .await
                .expect("reading accepted");
        }

        for expected in [3, 5, 7] {
            let record = timeout(Duration::from_millis(100), sub.recv())
                .await
                .expect("timeout waiting for reading")
                .expect("bus open");
            match record.event {
                LedgerEvent::TemperatureRegistered {
                    observation,
                    reporter,
                } => {
                    assert_eq!(observation, Observation::Point(expected));
                    assert_eq!(reporter, LOGGER);
                }
                other => panic!("Expected TemperatureRegistered, got {:?}", other),
            }
        }
        assert!(matches!(sub.try_recv(), Ok(None)));
    }

    /// Subscribers of other lots never see this lot's records.
    #[tokio::test]
    async fn test_other_lot_subscriber_sees_nothing() {
        let harness = sensor_gated_lot().await;
        let mut other = harness.bus.subscribe_lot("LOT-2024-002", EventFilter::all());
        let mut everything = harness.bus.subscribe(EventFilter::all());

        harness
            .service
            .register_temperature(LOT, LOGGER, Observation::Point(4))
            .await
            .unwrap();

        assert!(other.drain().is_empty());
        assert_eq!(everything.drain().len(), 1);
    }

    /// What subscribers receive is exactly what the ledger log holds.
    #[tokio::test]
    async fn test_bus_mirrors_ledger_log() {
        let harness = Harness::new(LedgerConfig::proof_of_concept(), 1_700_000_000);
        let mut sub = harness.bus.subscribe_lot(LOT, EventFilter::all());

        let service = &harness.service;
        service
            .create_lot(MANUFACTURER, LotParams::new(LOT, 2, 8))
            .await
            .unwrap();
        service
            .transfer_custody(LOT, MANUFACTURER, CARRIER)
            .await
            .unwrap();
        service
            .register_temperature(LOT, STRANGER, Observation::Point(12))
            .await
            .unwrap();
        service
            .authorize_sensor(LOT, CARRIER, LOGGER, true)
            .await
            .unwrap();

        let published = sub.drain();
        let logged = service.events(LOT, EventFilter::all()).await.unwrap();
        assert_eq!(published, logged);
        let sequences: Vec<u64> = logged.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
    }

    /// Downstream consumers read published records as tagged JSON.
    #[tokio::test]
    async fn test_published_records_export_as_json() {
        let harness = sensor_gated_lot().await;
        let mut sub = harness
            .bus
            .subscribe(EventFilter::kinds(vec![EventKind::CustodyTransferred]));
        harness
            .service
            .transfer_custody(LOT, MANUFACTURER, CARRIER)
            .await
            .unwrap();

        let record = sub.try_recv().unwrap().expect("transfer published");
        let json = record.to_json().expect("serialize record");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["sequence"], 3);
        assert_eq!(value["lot_id"], LOT);
        assert_eq!(value["event"]["type"], "CustodyTransferred");
        assert_eq!(value["event"]["stage"], "InTransit");
        assert_eq!(value["event"]["compromised"], false);

        let decoded: EventRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, record);
    }

    // =============================================================================
    // INTEGRATION TESTS: COMPROMISE HANDLING
    // =============================================================================

    /// The damage desk hears about a compromise once, with the holder at the time.
    #[tokio::test]
    async fn test_damage_desk_receives_compromise_snapshot() {
        let harness = Harness::new(LedgerConfig::proof_of_concept(), 1_700_000_000);
        let mut alerts = harness
            .bus
            .subscribe(EventFilter::kinds(vec![EventKind::LotCompromised]));

        let service = &harness.service;
        service
            .create_lot(MANUFACTURER, LotParams::new(LOT, 2, 8).with_sku("VACC-01"))
            .await
            .unwrap();
        service
            .transfer_custody(LOT, MANUFACTURER, CARRIER)
            .await
            .unwrap();
        harness.tick(3_600);
        let records = service
            .register_temperature(LOT, CARRIER, Observation::Range { min: 1, max: 6 })
            .await
            .unwrap();
        assert_eq!(records.len(), 2);

        // Still out of range; the lot is already compromised
        service
            .register_temperature(LOT, CARRIER, Observation::Point(-4))
            .await
            .unwrap();

        let alert = alerts.drain();
        assert_eq!(alert.len(), 1);
        match &alert[0].event {
            LedgerEvent::LotCompromised { owner, .. } => assert_eq!(*owner, CARRIER),
            other => panic!("Expected LotCompromised, got {:?}", other),
        }

        assert_eq!(harness.notifier.count(), 1);
        let snapshot = &harness.notifier.notifications()[0];
        assert_eq!(snapshot.lot_id, LOT);
        assert_eq!(snapshot.sku.as_deref(), Some("VACC-01"));
        assert_eq!(snapshot.current_owner, CARRIER);
        assert!(snapshot.compromised);
        assert_eq!(snapshot.readings, 1);
    }

    /// In a sensor-gated deployment a compromised lot refuses further readings.
    #[tokio::test]
    async fn test_sensor_gated_compromise_rejects_followups() {
        let harness = sensor_gated_lot().await;
        harness
            .service
            .register_temperature(LOT, LOGGER, Observation::Point(9))
            .await
            .unwrap();

        let before = harness.bus.events_published();
        let err = harness
            .service
            .register_temperature(LOT, LOGGER, Observation::Point(5))
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::AlreadyCompromised);
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(harness.bus.events_published(), before);
        assert_eq!(harness.notifier.count(), 1);
    }

    // =============================================================================
    // INTEGRATION TESTS: REJECTED COMMANDS
    // =============================================================================

    /// Rejections publish nothing and change nothing.
    #[tokio::test]
    async fn test_rejected_commands_publish_nothing() {
        let harness = sensor_gated_lot().await;
        let mut sub = harness.bus.subscribe(EventFilter::all());
        let before = harness.service.lot_info(LOT).await.unwrap();

        let service = &harness.service;
        assert!(matches!(
            service.transfer_custody(LOT, STRANGER, CARRIER).await,
            Err(LedgerError::NotOwner { .. })
        ));
        assert!(matches!(
            service
                .register_temperature(LOT, STRANGER, Observation::Point(5))
                .await,
            Err(LedgerError::Unauthorized { .. })
        ));
        assert_eq!(
            service
                .transfer_custody(LOT, MANUFACTURER, Identity::ZERO)
                .await,
            Err(LedgerError::InvalidTarget)
        );
        assert_eq!(
            service
                .register_temperature(LOT, LOGGER, Observation::Range { min: 8, max: 2 })
                .await
                .map_err(|e| e.kind()),
            Err(ErrorKind::InvalidArgument)
        );
        assert_eq!(
            service.reinitialize(LOT, MANUFACTURER, "LOT-NEW", 0, 4).await,
            Err(LedgerError::ReinitializeDisabled)
        );

        assert!(matches!(sub.try_recv(), Ok(None)));
        assert_eq!(service.lot_info(LOT).await.unwrap(), before);
        assert_eq!(harness.notifier.count(), 0);
    }

    /// A clock that jumps backwards cannot rewrite history.
    #[tokio::test]
    async fn test_clock_regression_rejected() {
        let harness = sensor_gated_lot().await;
        let last = harness.clock.now();

        harness.clock.set(last - 30);
        let err = harness
            .service
            .register_temperature(LOT, LOGGER, Observation::Point(5))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::TimestampRegression {
                last,
                now: last - 30
            }
        );

        // Same instant as the last commit is fine
        harness.clock.set(last);
        harness
            .service
            .register_temperature(LOT, LOGGER, Observation::Point(5))
            .await
            .unwrap();
        let history = harness.service.temperature_history(LOT).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].recorded_at, last);
    }

    // =============================================================================
    // INTEGRATION TESTS: TELEMETRY
    // =============================================================================

    /// Ledger activity shows up in the Prometheus export.
    #[tokio::test]
    async fn test_metrics_exported() {
        let harness = sensor_gated_lot().await;
        harness
            .service
            .register_temperature(LOT, LOGGER, Observation::Point(5))
            .await
            .unwrap();
        let _ = harness
            .service
            .transfer_custody(LOT, STRANGER, CARRIER)
            .await;

        let text = lot_telemetry::gather_metrics().expect("encode metrics");
        assert!(text.contains("lot_ledger_lots_created_total"));
        assert!(text.contains("lot_ledger_readings_registered_total"));
        assert!(text.contains("lot_ledger_events_published_total"));
        assert!(text.contains("lot_ledger_commands_rejected_total"));
    }
}
