//! Dose engine: prandial + correction insulin with contextual safety
//! adjustments.
//!
//! Combines the IC-ratio meal coverage, the ISF-based correction with IOB
//! subtracted, the 50% rule for carb-free corrections, and the contextual
//! multipliers into a single 0.5 U-quantized dose with a structured
//! breakdown.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::iob::calculate_iob;
use crate::messages::Message;
use crate::numeric::{round_decimals, round_to_half_unit};
use crate::safety::{apply_safety_factor, generate_warnings};
use crate::types::{DoseAdjustment, DoseInput, DoseSlot, InsulinProfile};

/// Hour assumed for dinner doses when the caller supplies no clock
/// context, so the evening reduction applies by default.
const DINNER_DEFAULT_HOUR: u32 = 19;

/// Itemization of how the dose was assembled.
///
/// `correction` is the gross correction (computed correction before the
/// IOB offset): it shows the clinician what the glucose alone called for,
/// while `iob` shows what was subtracted from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseBreakdown {
    /// Insulin covering the meal's carbohydrates.
    pub prandial: f64,
    /// Gross correction: net correction plus the IOB that offset it.
    pub correction: f64,
    /// Insulin still active from previous injections.
    pub iob: f64,
    /// Context factors applied, in application order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub adjustments: Vec<DoseAdjustment>,
}

/// A recommended dose with its breakdown and advisory warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseResult {
    /// Units to inject; non-negative and a multiple of 0.5.
    pub dose: f64,
    pub breakdown: DoseBreakdown,
    pub warnings: Vec<Message>,
}

/// Compute a recommended dose for one meal or correction.
pub fn calculate_dose(
    profile: &InsulinProfile,
    input: &DoseInput,
    now: DateTime<Utc>,
) -> DoseResult {
    let iob = calculate_iob(&input.previous_injections, now, profile.dia_hours);

    let ic_ratio = profile.ic_ratio.for_slot(input.slot.ic_slot());
    let prandial = if input.carbohydrates > 0.0 {
        input.carbohydrates / ic_ratio
    } else {
        0.0
    };

    let mut correction = (input.glucose - profile.target) / profile.isf - iob;
    if correction < -1.0 {
        // A deeply negative correction would mask real prandial need
        correction = 0.0;
    }
    let correction_applied = correction.max(0.0);

    let mut total = prandial + correction_applied;
    if input.slot == DoseSlot::Correction {
        total *= 0.5;
    }

    let (adjusted, adjustments) = apply_safety_factor(total, &input.context);
    let dose = round_to_half_unit(adjusted).max(0.0);

    tracing::debug!(
        slot = ?input.slot,
        glucose = input.glucose,
        iob,
        prandial,
        correction = correction_applied,
        dose,
        "dose computed"
    );

    let mut warnings = generate_warnings(
        input.glucose,
        iob,
        dose,
        input.carbohydrates,
        &input.context,
    );
    if dose > 0.0 && total > 0.0 && adjusted < total * 0.7 {
        let percent = (((total - adjusted) / total) * 100.0).round() as i32;
        warnings.push(Message::DoseReducedByFactors { percent });
    }

    DoseResult {
        dose,
        breakdown: DoseBreakdown {
            prandial: round_decimals(prandial, 2),
            correction: round_decimals(correction_applied + iob, 2),
            iob: round_decimals(iob, 2),
            adjustments,
        },
        warnings,
    }
}

/// Breakfast dose; the input's slot is overridden.
pub fn calculate_breakfast_dose(
    profile: &InsulinProfile,
    input: &DoseInput,
    now: DateTime<Utc>,
) -> DoseResult {
    let input = DoseInput {
        slot: DoseSlot::Breakfast,
        ..input.clone()
    };
    calculate_dose(profile, &input, now)
}

/// Lunch dose; the input's slot is overridden.
pub fn calculate_lunch_dose(
    profile: &InsulinProfile,
    input: &DoseInput,
    now: DateTime<Utc>,
) -> DoseResult {
    let input = DoseInput {
        slot: DoseSlot::Lunch,
        ..input.clone()
    };
    calculate_dose(profile, &input, now)
}

/// Dinner dose; defaults the clock context to 19:00 so the evening
/// reduction applies unless the caller overrides the hour.
pub fn calculate_dinner_dose(
    profile: &InsulinProfile,
    input: &DoseInput,
    now: DateTime<Utc>,
) -> DoseResult {
    let mut input = DoseInput {
        slot: DoseSlot::Dinner,
        ..input.clone()
    };
    if input.context.hour_of_day.is_none() {
        input.context.hour_of_day = Some(DINNER_DEFAULT_HOUR);
    }
    calculate_dose(profile, &input, now)
}

/// Carb-free correction dose: forces the correction slot and zero
/// carbohydrates, which also makes the 50% rule apply.
pub fn calculate_correction_dose(
    profile: &InsulinProfile,
    input: &DoseInput,
    now: DateTime<Utc>,
) -> DoseResult {
    let mut input = DoseInput {
        slot: DoseSlot::Correction,
        ..input.clone()
    };
    input.carbohydrates = 0.0;
    calculate_dose(profile, &input, now)
}
