//! # Domain Value Objects
//!
//! Immutable value types for the Lot Integrity Ledger: identities,
//! temperature envelopes, observations, lifecycle stages, and the
//! one-way integrity state.

use super::errors::LedgerError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address type (20-byte account identifier).
pub type Address = [u8; 20];

/// Unix timestamp in seconds, supplied by the execution environment.
pub type Timestamp = u64;

/// Temperature in whole degrees Celsius.
pub type Celsius = i32;

/// Identity of a caller, owner, manufacturer, or sensor.
///
/// Identities are asserted by the surrounding environment; the ledger never
/// authenticates them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity(pub Address);

impl Identity {
    /// The null identity. Never a valid custody target.
    pub const ZERO: Identity = Identity([0u8; 20]);

    /// Create an identity from raw address bytes.
    pub const fn new(address: Address) -> Self {
        Self(address)
    }

    /// Whether this is the null identity.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &Address {
        &self.0
    }
}

impl From<Address> for Identity {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Accepted temperature range `[min, max]`, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EnvelopeBounds")]
pub struct Envelope {
    min: Celsius,
    max: Celsius,
}

/// Unchecked wire form of [`Envelope`].
#[derive(Deserialize)]
struct EnvelopeBounds {
    min: Celsius,
    max: Celsius,
}

impl TryFrom<EnvelopeBounds> for Envelope {
    type Error = LedgerError;

    fn try_from(bounds: EnvelopeBounds) -> Result<Self, Self::Error> {
        Envelope::new(bounds.min, bounds.max)
    }
}

impl Envelope {
    /// Create an envelope. Fails if `min > max`.
    pub fn new(min: Celsius, max: Celsius) -> Result<Self, LedgerError> {
        if min > max {
            return Err(LedgerError::InvalidEnvelope { min, max });
        }
        Ok(Self { min, max })
    }

    /// Lower bound.
    pub fn min(&self) -> Celsius {
        self.min
    }

    /// Upper bound.
    pub fn max(&self) -> Celsius {
        self.max
    }

    /// Whether `value` lies inside the envelope.
    pub fn contains(&self, value: Celsius) -> bool {
        value >= self.min && value <= self.max
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// A single environmental observation reported against a lot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Observation {
    /// One measured value.
    Point(Celsius),
    /// Observed minimum and maximum over a reporting window.
    Range {
        /// Lowest value seen in the window.
        min: Celsius,
        /// Highest value seen in the window.
        max: Celsius,
    },
}

impl Observation {
    /// Build a range observation. Fails if `min > max`.
    pub fn range(min: Celsius, max: Celsius) -> Result<Self, LedgerError> {
        let observation = Observation::Range { min, max };
        observation.validate()?;
        Ok(observation)
    }

    /// Reject malformed ranges.
    pub fn validate(&self) -> Result<(), LedgerError> {
        match *self {
            Observation::Range { min, max } if min > max => {
                Err(LedgerError::InvalidObservation { min, max })
            }
            _ => Ok(()),
        }
    }

    /// Lowest observed value.
    pub fn lowest(&self) -> Celsius {
        match *self {
            Observation::Point(value) => value,
            Observation::Range { min, .. } => min,
        }
    }

    /// Highest observed value.
    pub fn highest(&self) -> Celsius {
        match *self {
            Observation::Point(value) => value,
            Observation::Range { max, .. } => max,
        }
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observation::Point(value) => write!(f, "{value}"),
            Observation::Range { min, max } => write!(f, "{min}..{max}"),
        }
    }
}

/// Custody lifecycle stage, derived from the number of transfers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LifecycleStage {
    /// With the manufacturer, no transfers yet.
    #[default]
    Created,
    /// One transfer (manufacturer to distributor).
    InTransit,
    /// Two transfers.
    InWarehouse,
    /// Three or more transfers. Terminal.
    Delivered,
}

impl LifecycleStage {
    /// Stage reached after `transfers` custody transfers.
    pub fn from_transfer_count(transfers: usize) -> Self {
        match transfers {
            0 => Self::Created,
            1 => Self::InTransit,
            2 => Self::InWarehouse,
            _ => Self::Delivered,
        }
    }
}

/// Which bound an observation broke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    /// Observed value under the envelope minimum.
    BelowMinimum,
    /// Observed value over the envelope maximum.
    AboveMaximum,
}

/// A detected envelope violation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Which bound was broken.
    pub kind: ViolationKind,
    /// The offending observed value.
    pub observed: Celsius,
    /// The bound it was compared against.
    pub limit: Celsius,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ViolationKind::BelowMinimum => write!(
                f,
                "temperature {} below minimum {}",
                self.observed, self.limit
            ),
            ViolationKind::AboveMaximum => write!(
                f,
                "temperature {} above maximum {}",
                self.observed, self.limit
            ),
        }
    }
}

/// Compliance state of a lot.
///
/// Only `Intact -> Compromised` is expressible through [`IntegrityState::compromise`].
/// Returning to `Intact` requires building a fresh state, which only
/// reinitialization does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegrityState {
    /// No violation recorded.
    #[default]
    Intact,
    /// A violation was recorded. Terminal.
    Compromised {
        /// When the first violation was recorded.
        since: Timestamp,
        /// The first violation.
        violation: Violation,
    },
}

impl IntegrityState {
    /// Whether a violation has been recorded.
    pub fn is_compromised(&self) -> bool {
        matches!(self, Self::Compromised { .. })
    }

    /// Record a violation. Returns `true` only on the first one.
    pub fn compromise(&mut self, violation: Violation, at: Timestamp) -> bool {
        match self {
            Self::Intact => {
                *self = Self::Compromised {
                    since: at,
                    violation,
                };
                true
            }
            Self::Compromised { .. } => false,
        }
    }

    /// The first recorded violation, if any.
    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Self::Intact => None,
            Self::Compromised { violation, .. } => Some(violation),
        }
    }
}
