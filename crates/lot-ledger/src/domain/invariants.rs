//! # Domain Invariants
//!
//! Business rules for the Lot Integrity Ledger.

use super::entities::Lot;
use super::errors::LedgerError;
use super::value_objects::{Identity, LifecycleStage, Timestamp};
use thiserror::Error;

/// Invariant: ownership-gated mutation.
///
/// Only the current custody holder may act as owner.
pub fn invariant_owner_only(caller: Identity, owner: Identity) -> Result<(), LedgerError> {
    if caller != owner {
        return Err(LedgerError::NotOwner { caller });
    }
    Ok(())
}

/// Invariant: targets are never the null identity.
pub fn invariant_valid_target(target: Identity) -> Result<(), LedgerError> {
    if target.is_zero() {
        return Err(LedgerError::InvalidTarget);
    }
    Ok(())
}

/// Invariant: lot identifiers are non-empty.
pub fn invariant_lot_id(lot_id: &str) -> Result<(), LedgerError> {
    if lot_id.trim().is_empty() {
        return Err(LedgerError::EmptyLotId);
    }
    Ok(())
}

/// Invariant: command time never goes backwards.
pub fn invariant_monotonic_time(last: Timestamp, now: Timestamp) -> Result<(), LedgerError> {
    if now < last {
        return Err(LedgerError::TimestampRegression { last, now });
    }
    Ok(())
}

/// Structural invariant broken in a lot snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// Custody history has no entries.
    #[error("custody history is empty")]
    EmptyCustodyLog,
    /// Last custody entry does not name the current owner.
    #[error("custody tail {tail} differs from current owner {owner}")]
    CustodyTailMismatch {
        /// Owner in the last custody entry.
        tail: Identity,
        /// Current owner.
        owner: Identity,
    },
    /// Stage does not match the transfer count.
    #[error("stage {stage:?} does not match {transfers} transfers")]
    StageMismatch {
        /// Recorded stage.
        stage: LifecycleStage,
        /// Counted transfers.
        transfers: usize,
    },
    /// Envelope bounds are inverted.
    #[error("envelope min {min} exceeds max {max}")]
    InvertedEnvelope {
        /// Lower bound.
        min: i32,
        /// Upper bound.
        max: i32,
    },
}

/// Check every structural invariant of a lot.
pub fn check_lot_invariants(lot: &Lot) -> Result<(), InvariantViolation> {
    let custody = lot.custody();
    let tail = custody
        .history()
        .last()
        .ok_or(InvariantViolation::EmptyCustodyLog)?;
    if tail.owner != custody.current_owner() {
        return Err(InvariantViolation::CustodyTailMismatch {
            tail: tail.owner,
            owner: custody.current_owner(),
        });
    }

    let expected = LifecycleStage::from_transfer_count(custody.transfers());
    if expected != custody.stage() {
        return Err(InvariantViolation::StageMismatch {
            stage: custody.stage(),
            transfers: custody.transfers(),
        });
    }

    let envelope = lot.envelope();
    if envelope.min() > envelope.max() {
        return Err(InvariantViolation::InvertedEnvelope {
            min: envelope.min(),
            max: envelope.max(),
        });
    }
    Ok(())
}
