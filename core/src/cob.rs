//! Carbs-on-board decay model.
//!
//! Same linear law as the insulin model, keyed by the meal's absorption
//! speed: fast 3 h, normal 4 h, slow 5 h, very slow 6 h. Totals are
//! reported in whole grams.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::numeric::{decay_fraction, round_decimals};
use crate::types::{Meal, MealAbsorption};

/// Total unabsorbed carbohydrate from past meals, rounded to whole grams.
pub fn calculate_cob(meals: &[Meal], now: DateTime<Utc>) -> i32 {
    let total: f64 = meals
        .iter()
        .map(|meal| calculate_remaining_cob(meal.carbohydrates, meal.hours_before(now), meal.absorption))
        .sum();
    total.round() as i32
}

/// Carbohydrate remaining from a single meal after `hours_since` hours.
///
/// Returns 0 outside `[0, duration)` for the meal's absorption speed.
pub fn calculate_remaining_cob(
    carbohydrates: f64,
    hours_since: f64,
    absorption: MealAbsorption,
) -> f64 {
    let duration = absorption.duration_hours();
    if hours_since < 0.0 || hours_since >= duration {
        return 0.0;
    }
    carbohydrates * decay_fraction(hours_since, duration)
}

/// How much of a meal has been absorbed, as an integer percentage.
///
/// 0 before the absorption window starts, 100 once it has elapsed.
pub fn percentage_absorbed(hours_since: f64, absorption: MealAbsorption) -> i32 {
    if hours_since < 0.0 {
        return 0;
    }
    let fraction = hours_since / absorption.duration_hours();
    ((fraction * 100.0).round() as i32).clamp(0, 100)
}

// ============================================================================
// Aggregate Breakdown
// ============================================================================

/// Per-meal absorption state, reported alongside the total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MealOnBoard {
    pub timestamp: DateTime<Utc>,
    pub absorption: MealAbsorption,
    /// Grams still unabsorbed, rounded to 2 decimals.
    pub remaining_grams: f64,
    pub percent_absorbed: i32,
}

/// Complete carbs-on-board picture for display or logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CobBreakdown {
    /// Whole-gram total across all meals.
    pub total_grams: i32,
    /// One entry per meal still inside its absorption window.
    pub meals: Vec<MealOnBoard>,
}

/// Compute the total plus a per-active-meal breakdown.
pub fn cob_breakdown(meals: &[Meal], now: DateTime<Utc>) -> CobBreakdown {
    let active = meals
        .iter()
        .filter_map(|meal| {
            let hours = meal.hours_before(now);
            let remaining = calculate_remaining_cob(meal.carbohydrates, hours, meal.absorption);
            if remaining > 0.0 {
                Some(MealOnBoard {
                    timestamp: meal.timestamp,
                    absorption: meal.absorption,
                    remaining_grams: round_decimals(remaining, 2),
                    percent_absorbed: percentage_absorbed(hours, meal.absorption),
                })
            } else {
                None
            }
        })
        .collect();

    CobBreakdown {
        total_grams: calculate_cob(meals, now),
        meals: active,
    }
}
