//! # Sensor Authorization Registry
//!
//! Which identities may report temperature when reporting is sensor-gated.

use super::errors::LedgerError;
use super::invariants::invariant_valid_target;
use super::value_objects::Identity;
use crate::config::SensorAdminPolicy;
use serde::Serialize;
use std::collections::BTreeMap;

/// Identity → enabled flag. Unknown identities are not authorized.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SensorRegistry {
    sensors: BTreeMap<Identity, bool>,
}

impl SensorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `caller` may change authorizations.
    pub fn check_admin(
        policy: SensorAdminPolicy,
        caller: Identity,
        manufacturer: Identity,
        owner: Identity,
    ) -> Result<(), LedgerError> {
        let allowed = match policy {
            SensorAdminPolicy::ManufacturerOnly => caller == manufacturer,
            SensorAdminPolicy::ManufacturerOrOwner => caller == manufacturer || caller == owner,
        };
        if !allowed {
            return Err(LedgerError::Unauthorized { caller });
        }
        Ok(())
    }

    /// Set the flag for `target`. Returns the previous value.
    pub fn set(&mut self, target: Identity, enabled: bool) -> Result<bool, LedgerError> {
        invariant_valid_target(target)?;
        let previous = self.sensors.insert(target, enabled).unwrap_or(false);
        Ok(previous)
    }

    /// Pure lookup, default false.
    pub fn is_authorized(&self, identity: &Identity) -> bool {
        self.sensors.get(identity).copied().unwrap_or(false)
    }

    /// Identities currently enabled.
    pub fn authorized(&self) -> impl Iterator<Item = &Identity> {
        self.sensors
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(id, _)| id)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.sensors.clear();
    }
}
