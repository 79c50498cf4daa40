//! Defensive input guards.
//!
//! The engine assumes well-formed numeric inputs and clamps rather than
//! errors during computation; these guards let the calling tier enforce
//! that contract before invoking it. They are never called from inside
//! the calculation paths.

use crate::errors::EngineError;
use crate::types::{DoseInput, InsulinProfile};

fn check_finite(value: f64, field: &'static str) -> Result<(), EngineError> {
    if value.is_nan() || value.is_infinite() {
        return Err(EngineError::NonFinite { field });
    }
    Ok(())
}

fn check_range(
    value: f64,
    field: &str,
    min: f64,
    max: f64,
) -> Result<(), EngineError> {
    if value < min || value > max {
        return Err(EngineError::Validation(format!(
            "{field} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

/// Validate a glucose reading (mg/dL).
pub fn validate_glucose(glucose: f64) -> Result<(), EngineError> {
    check_finite(glucose, "glucose")?;
    check_range(glucose, "glucose", 20.0, 1000.0)
}

/// Validate a carbohydrate amount (grams).
pub fn validate_carbohydrates(grams: f64) -> Result<(), EngineError> {
    check_finite(grams, "carbohydrates")?;
    check_range(grams, "carbohydrates", 0.0, 500.0)
}

/// Validate an insulin amount (units).
pub fn validate_insulin_units(units: f64) -> Result<(), EngineError> {
    check_finite(units, "insulin units")?;
    check_range(units, "insulin units", 0.0, 100.0)
}

/// Validate a duration of insulin action (hours). Typical values are 3-5.
pub fn validate_dia_hours(dia_hours: f64) -> Result<(), EngineError> {
    check_finite(dia_hours, "dia_hours")?;
    check_range(dia_hours, "dia_hours", 1.0, 12.0)
}

/// Validate an insulin sensitivity factor (mg/dL per unit).
pub fn validate_isf(isf: f64) -> Result<(), EngineError> {
    check_finite(isf, "isf")?;
    check_range(isf, "isf", 5.0, 500.0)
}

/// Validate a full insulin profile.
pub fn validate_profile(profile: &InsulinProfile) -> Result<(), EngineError> {
    validate_isf(profile.isf)?;
    validate_dia_hours(profile.dia_hours)?;
    check_finite(profile.target, "target")?;
    check_range(profile.target, "target", 70.0, 200.0)?;
    for (field, ratio) in [
        ("ic_ratio.breakfast", profile.ic_ratio.breakfast),
        ("ic_ratio.lunch", profile.ic_ratio.lunch),
        ("ic_ratio.dinner", profile.ic_ratio.dinner),
    ] {
        check_finite(ratio, "ic_ratio")?;
        check_range(ratio, field, 1.0, 150.0)?;
    }
    Ok(())
}

/// Validate a dose calculation input.
pub fn validate_dose_input(input: &DoseInput) -> Result<(), EngineError> {
    validate_glucose(input.glucose)?;
    validate_carbohydrates(input.carbohydrates)?;
    for injection in &input.previous_injections {
        validate_insulin_units(injection.units)?;
    }
    if let Some(hour) = input.context.hour_of_day {
        if hour > 23 {
            return Err(EngineError::Validation(format!(
                "hour_of_day must be between 0 and 23, got {hour}"
            )));
        }
    }
    Ok(())
}
