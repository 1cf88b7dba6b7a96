//! # Domain Errors
//!
//! Error types for the Lot Integrity Ledger.
//!
//! Every failure leaves the lot unchanged and carries a stable code.

use super::value_objects::{Celsius, Identity, Timestamp};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad failure category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Caller lacks the required role.
    AccessDenied,
    /// Command not allowed in the current lot state.
    InvalidState,
    /// Malformed input.
    InvalidArgument,
}

/// Ledger error types.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Caller is not the current custody holder.
    #[error("Caller {caller} is not the current owner")]
    NotOwner {
        /// Rejected caller.
        caller: Identity,
    },

    /// Caller is not allowed to perform this operation.
    #[error("Caller {caller} is not authorized")]
    Unauthorized {
        /// Rejected caller.
        caller: Identity,
    },

    /// The lot was already created on this ledger.
    #[error("Lot already created: {0}")]
    AlreadyCreated(String),

    /// No lot has been created yet.
    #[error("Lot not created")]
    NotCreated,

    /// The lot is compromised and the ledger rejects further readings.
    #[error("Lot already compromised")]
    AlreadyCompromised,

    /// Reinitialization is turned off for this ledger.
    #[error("Reinitialization disabled")]
    ReinitializeDisabled,

    /// Envelope with `min > max`.
    #[error("Invalid envelope: min {min} > max {max}")]
    InvalidEnvelope {
        /// Requested minimum.
        min: Celsius,
        /// Requested maximum.
        max: Celsius,
    },

    /// Range observation with `min > max`.
    #[error("Invalid observation: min {min} > max {max}")]
    InvalidObservation {
        /// Observed minimum.
        min: Celsius,
        /// Observed maximum.
        max: Celsius,
    },

    /// Null identity used as a custody or sensor target.
    #[error("Invalid target identity")]
    InvalidTarget,

    /// Empty lot identifier.
    #[error("Lot id must not be empty")]
    EmptyLotId,

    /// Command timestamp earlier than the last committed command.
    #[error("Timestamp regression: {now} < {last}")]
    TimestampRegression {
        /// Timestamp of the last committed command.
        last: Timestamp,
        /// Timestamp supplied with the rejected command.
        now: Timestamp,
    },

    /// No hosted lot with this id.
    #[error("Lot not found: {0}")]
    LotNotFound(String),
}

impl LedgerError {
    /// Failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotOwner { .. } | Self::Unauthorized { .. } => ErrorKind::AccessDenied,
            Self::AlreadyCreated(_)
            | Self::NotCreated
            | Self::AlreadyCompromised
            | Self::ReinitializeDisabled => ErrorKind::InvalidState,
            Self::InvalidEnvelope { .. }
            | Self::InvalidObservation { .. }
            | Self::InvalidTarget
            | Self::EmptyLotId
            | Self::TimestampRegression { .. }
            | Self::LotNotFound(_) => ErrorKind::InvalidArgument,
        }
    }

    /// Stable machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotOwner { .. } => "NOT_OWNER",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::AlreadyCreated(_) => "ALREADY_CREATED",
            Self::NotCreated => "NOT_CREATED",
            Self::AlreadyCompromised => "ALREADY_COMPROMISED",
            Self::ReinitializeDisabled => "REINITIALIZE_DISABLED",
            Self::InvalidEnvelope { .. } => "INVALID_ENVELOPE",
            Self::InvalidObservation { .. } => "INVALID_OBSERVATION",
            Self::InvalidTarget => "INVALID_TARGET",
            Self::EmptyLotId => "EMPTY_LOT_ID",
            Self::TimestampRegression { .. } => "TIMESTAMP_REGRESSION",
            Self::LotNotFound(_) => "LOT_NOT_FOUND",
        }
    }

    /// Whether this is an access-control failure.
    pub fn is_access_denied(&self) -> bool {
        self.kind() == ErrorKind::AccessDenied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_owner_error() {
        let err = LedgerError::NotOwner {
            caller: Identity::new([0xAA; 20]),
        };
        assert!(err.to_string().contains("not the current owner"));
        assert_eq!(err.kind(), ErrorKind::AccessDenied);
        assert_eq!(err.code(), "NOT_OWNER");
    }

    #[test]
    fn test_invalid_envelope_error() {
        let err = LedgerError::InvalidEnvelope { min: 8, max: 2 };
        assert_eq!(err.to_string(), "Invalid envelope: min 8 > max 2");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_state_errors() {
        assert_eq!(LedgerError::AlreadyCompromised.kind(), ErrorKind::InvalidState);
        assert_eq!(LedgerError::ReinitializeDisabled.kind(), ErrorKind::InvalidState);
        assert_eq!(
            LedgerError::AlreadyCreated("LOT-1".into()).code(),
            "ALREADY_CREATED"
        );
    }

    #[test]
    fn test_timestamp_regression_error() {
        let err = LedgerError::TimestampRegression { last: 200, now: 100 };
        assert!(err.to_string().contains("100 < 200"));
    }
}
