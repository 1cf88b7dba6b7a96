//! # Custody Tracker
//!
//! Current holder, lifecycle stage, and the append-only custody history.

use super::errors::LedgerError;
use super::invariants::{invariant_owner_only, invariant_valid_target};
use super::value_objects::{Identity, LifecycleStage, Timestamp};
use serde::{Deserialize, Serialize};

/// One entry of the custody history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyRecord {
    /// Holder from this point on.
    pub owner: Identity,
    /// When custody was taken.
    pub since: Timestamp,
}

/// Result of a successful transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CustodyChange {
    /// Previous holder.
    pub from: Identity,
    /// New holder.
    pub to: Identity,
    /// Stage after the transfer.
    pub stage: LifecycleStage,
}

/// Tracks who holds the lot and how it got there.
#[derive(Clone, Debug, Serialize)]
pub struct CustodyTracker {
    owner: Identity,
    stage: LifecycleStage,
    /// Transfers since creation or the last restart.
    transfers: usize,
    log: Vec<CustodyRecord>,
}

impl CustodyTracker {
    /// Start a custody chain with `holder` as the first entry.
    pub fn new(holder: Identity, at: Timestamp) -> Self {
        Self {
            owner: holder,
            stage: LifecycleStage::Created,
            transfers: 0,
            log: vec![CustodyRecord {
                owner: holder,
                since: at,
            }],
        }
    }

    /// Current holder.
    pub fn current_owner(&self) -> Identity {
        self.owner
    }

    /// Current lifecycle stage.
    pub fn stage(&self) -> LifecycleStage {
        self.stage
    }

    /// Transfers counted toward the current stage.
    pub fn transfers(&self) -> usize {
        self.transfers
    }

    /// Full custody history, oldest first.
    pub fn history(&self) -> &[CustodyRecord] {
        &self.log
    }

    /// Validate a transfer without applying it.
    pub fn check_transfer(&self, caller: Identity, new_owner: Identity) -> Result<(), LedgerError> {
        invariant_owner_only(caller, self.owner)?;
        invariant_valid_target(new_owner)
    }

    /// Hand custody to `new_owner`.
    pub fn transfer(
        &mut self,
        caller: Identity,
        new_owner: Identity,
        at: Timestamp,
    ) -> Result<CustodyChange, LedgerError> {
        self.check_transfer(caller, new_owner)?;

        let from = self.owner;
        self.owner = new_owner;
        self.transfers += 1;
        self.stage = LifecycleStage::from_transfer_count(self.transfers);
        self.log.push(CustodyRecord {
            owner: new_owner,
            since: at,
        });

        Ok(CustodyChange {
            from,
            to: new_owner,
            stage: self.stage,
        })
    }

    /// Begin a new stage count with `holder`, keeping prior history.
    pub fn restart(&mut self, holder: Identity, at: Timestamp) {
        self.owner = holder;
        self.transfers = 0;
        self.stage = LifecycleStage::Created;
        self.log.push(CustodyRecord {
            owner: holder,
            since: at,
        });
    }
}
