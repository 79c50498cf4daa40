//! Rounding helpers shared by the decay and dose calculations.
//!
//! Insulin pens deliver in 0.5 U increments, so final doses are quantized
//! to that step. Decay fractions are held at a fixed precision so the
//! repeated `1 - t/T` arithmetic produces identical results across
//! platforms.

/// Round a dose to the nearest 0.5 unit.
pub fn round_to_half_unit(units: f64) -> f64 {
    (units * 2.0).round() / 2.0
}

/// Round to a fixed number of decimal digits.
pub fn round_decimals(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}

/// Linear decay fraction `1 - elapsed/duration`, clamped to `[0, 1]` and
/// held at 6 decimals.
pub fn decay_fraction(hours_elapsed: f64, duration_hours: f64) -> f64 {
    if duration_hours <= 0.0 {
        return 0.0;
    }
    let remaining = 1.0 - hours_elapsed / duration_hours;
    round_decimals(remaining.clamp(0.0, 1.0), 6)
}
