//! # Compliance Engine
//!
//! Decides whether an observation breaks the accepted envelope.
//! Bounds are inclusive: a value equal to `min` or `max` is compliant.

use crate::domain::{Celsius, Envelope, Observation, Violation, ViolationKind};

/// Violation iff `value < min` or `value > max`.
pub fn evaluate_point(value: Celsius, min: Celsius, max: Celsius) -> bool {
    value < min || value > max
}

/// Violation iff `observed_min < min` or `observed_max > max`.
///
/// The observed interval must sit entirely inside the envelope; partial
/// overlap is a violation.
pub fn evaluate_range(
    observed_min: Celsius,
    observed_max: Celsius,
    min: Celsius,
    max: Celsius,
) -> bool {
    observed_min < min || observed_max > max
}

/// Evaluate an observation and describe the first broken bound.
///
/// The lower bound is checked first.
pub fn evaluate(observation: &Observation, envelope: &Envelope) -> Option<Violation> {
    let (min, max) = (envelope.min(), envelope.max());
    let violated = match *observation {
        Observation::Point(value) => evaluate_point(value, min, max),
        Observation::Range {
            min: observed_min,
            max: observed_max,
        } => evaluate_range(observed_min, observed_max, min, max),
    };
    if !violated {
        return None;
    }

    let lowest = observation.lowest();
    if lowest < min {
        return Some(Violation {
            kind: ViolationKind::BelowMinimum,
            observed: lowest,
            limit: min,
        });
    }
    Some(Violation {
        kind: ViolationKind::AboveMaximum,
        observed: observation.highest(),
        limit: max,
    })
}
