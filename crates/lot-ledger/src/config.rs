//! Configuration for the Lot Integrity Ledger
//!
//! Deployed ledgers disagree on who may report readings, what happens to
//! readings on a compromised lot, who administers sensors, and whether a
//! lot may be reinitialized. Each is an explicit policy chosen at
//! construction.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Unrecognized policy string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {policy} value: {value}")]
pub struct PolicyParseError {
    /// Policy being parsed.
    pub policy: &'static str,
    /// Rejected input.
    pub value: String,
}

/// Who may call `register_temperature`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportingPolicy {
    /// Any caller.
    Open,
    /// Only the current owner.
    OwnerOnly,
    /// Only identities enabled in the sensor registry.
    #[default]
    AuthorizedSensors,
}

/// What happens to a reading on an already-compromised lot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompromisedReadingPolicy {
    /// Record it; the lot stays compromised.
    #[default]
    Record,
    /// Reject it with `AlreadyCompromised`.
    Reject,
}

/// Who may change sensor authorizations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorAdminPolicy {
    /// The manufacturer only.
    ManufacturerOnly,
    /// The manufacturer or the current owner.
    #[default]
    ManufacturerOrOwner,
}

/// Whether and by whom a lot may be reinitialized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReinitializePolicy {
    /// Reinitialization is rejected.
    #[default]
    Disabled,
    /// Only the current owner.
    OwnerOnly,
    /// Any caller. Matches the proof-of-concept deployment, where a lot's
    /// identity can be rebound by anyone.
    LegacyUnrestricted,
}

macro_rules! policy_strings {
    ($ty:ty, $name:literal, { $($variant:path => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// Canonical configuration string.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($variant => $text,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = PolicyParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($variant),)+
                    _ => Err(PolicyParseError {
                        policy: $name,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

policy_strings!(ReportingPolicy, "reporting policy", {
    ReportingPolicy::Open => "open",
    ReportingPolicy::OwnerOnly => "owner_only",
    ReportingPolicy::AuthorizedSensors => "authorized_sensors",
});

policy_strings!(CompromisedReadingPolicy, "compromised reading policy", {
    CompromisedReadingPolicy::Record => "record",
    CompromisedReadingPolicy::Reject => "reject",
});

policy_strings!(SensorAdminPolicy, "sensor admin policy", {
    SensorAdminPolicy::ManufacturerOnly => "manufacturer_only",
    SensorAdminPolicy::ManufacturerOrOwner => "manufacturer_or_owner",
});

policy_strings!(ReinitializePolicy, "reinitialize policy", {
    ReinitializePolicy::Disabled => "disabled",
    ReinitializePolicy::OwnerOnly => "owner_only",
    ReinitializePolicy::LegacyUnrestricted => "legacy_unrestricted",
});

/// Ledger configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Who may report temperature.
    pub reporting: ReportingPolicy,
    /// Readings on a compromised lot.
    pub compromised_readings: CompromisedReadingPolicy,
    /// Who may change sensor authorizations.
    pub sensor_admin: SensorAdminPolicy,
    /// Reinitialization gate.
    pub reinitialize: ReinitializePolicy,
}

impl LedgerConfig {
    /// Proof-of-concept deployment: anyone reports, compromised lots keep
    /// recording, anyone can reinitialize.
    pub fn proof_of_concept() -> Self {
        Self {
            reporting: ReportingPolicy::Open,
            compromised_readings: CompromisedReadingPolicy::Record,
            sensor_admin: SensorAdminPolicy::ManufacturerOrOwner,
            reinitialize: ReinitializePolicy::LegacyUnrestricted,
        }
    }

    /// Sensor-attributed deployment: only authorized sensors report and
    /// compromised lots refuse further readings.
    pub fn sensor_gated() -> Self {
        Self {
            reporting: ReportingPolicy::AuthorizedSensors,
            compromised_readings: CompromisedReadingPolicy::Reject,
            sensor_admin: SensorAdminPolicy::ManufacturerOnly,
            reinitialize: ReinitializePolicy::Disabled,
        }
    }

    /// Owner-reported deployment: the custody holder reports readings.
    pub fn owner_reported() -> Self {
        Self {
            reporting: ReportingPolicy::OwnerOnly,
            ..Self::default()
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LOT_REPORTING_POLICY`: `open` | `owner_only` | `authorized_sensors`
    /// - `LOT_COMPROMISED_POLICY`: `record` | `reject`
    /// - `LOT_SENSOR_ADMIN`: `manufacturer_only` | `manufacturer_or_owner`
    /// - `LOT_REINITIALIZE`: `disabled` | `owner_only` | `legacy_unrestricted`
    ///
    /// Missing or unparsable values keep the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            reporting: env_policy("LOT_REPORTING_POLICY", defaults.reporting),
            compromised_readings: env_policy("LOT_COMPROMISED_POLICY", defaults.compromised_readings),
            sensor_admin: env_policy("LOT_SENSOR_ADMIN", defaults.sensor_admin),
            reinitialize: env_policy("LOT_REINITIALIZE", defaults.reinitialize),
        }
    }
}

fn env_policy<T>(key: &str, default: T) -> T
where
    T: FromStr<Err = PolicyParseError> + Copy,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|e: PolicyParseError| {
            warn!(key, error = %e, "Ignoring invalid policy, using default");
            default
        }),
        Err(_) => default,
    }
}
