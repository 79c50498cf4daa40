//! Safety rules: contextual multipliers, the 3-hour interval rule,
//! pre-sleep evaluation, conservative between-meal corrections, and
//! warning generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::iob::{calculate_iob, hours_since_last_injection, is_safe_for_new_dose};
use crate::messages::Message;
use crate::numeric::{round_decimals, round_to_half_unit};
use crate::types::{ContextFactor, DoseAdjustment, DoseContext, Injection};

/// Minimum spacing between correction doses (the "3-hour rule").
pub const MINIMUM_DOSE_INTERVAL_HOURS: f64 = 3.0;

/// Pre-sleep target glucose, deliberately above the daytime target.
pub const SLEEP_TARGET_MG_DL: f64 = 140.0;

/// Snack size suggested against nocturnal hypoglycemia, in grams.
pub const SNACK_CARBOHYDRATES_G: u32 = 15;

// ============================================================================
// Contextual Multipliers
// ============================================================================

/// Late-night window, 22:00 through 06:59.
fn is_late_night(hour: u32) -> bool {
    hour >= 22 || hour <= 6
}

/// Evening window around dinner, 19:00 through 21:59.
///
/// Kept separate from the late-night window even though both currently
/// apply the same -5%; the two windows are disjoint so the reduction
/// never stacks.
fn is_evening(hour: u32) -> bool {
    (19..22).contains(&hour)
}

/// Scale a dose by every active contextual factor.
///
/// Multipliers compose multiplicatively and commute, so application
/// order does not matter. No active factor means identity and an empty
/// adjustment list.
pub fn apply_safety_factor(dose: f64, context: &DoseContext) -> (f64, Vec<DoseAdjustment>) {
    let mut factors = Vec::new();
    if context.recent_exercise {
        factors.push(ContextFactor::Exercise);
    }
    if context.alcohol {
        factors.push(ContextFactor::Alcohol);
    }
    if context.illness {
        factors.push(ContextFactor::Illness);
    }
    if context.stress {
        factors.push(ContextFactor::Stress);
    }
    if context.menstruation {
        factors.push(ContextFactor::Menstruation);
    }
    if let Some(hour) = context.hour_of_day {
        if is_late_night(hour) || is_evening(hour) {
            factors.push(ContextFactor::Nocturnal);
        }
    }
    if context.high_fat_meal {
        factors.push(ContextFactor::HighFatMeal);
    }

    let mut adjusted = dose;
    let adjustments: Vec<DoseAdjustment> = factors
        .into_iter()
        .map(|factor| {
            adjusted *= factor.multiplier();
            DoseAdjustment::from(factor)
        })
        .collect();

    if !adjustments.is_empty() {
        tracing::debug!(dose, adjusted, count = adjustments.len(), "applied context factors");
    }
    (adjusted, adjustments)
}

/// Whether a new correction is allowed under the 3-hour rule.
pub fn check_three_hour_rule(injections: &[Injection], now: DateTime<Utc>) -> bool {
    is_safe_for_new_dose(injections, now, MINIMUM_DOSE_INTERVAL_HOURS)
}

// ============================================================================
// Pre-Sleep Evaluation
// ============================================================================

/// What to do before going to bed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreSleepAction {
    Sleep,
    EatSnack,
    SmallCorrection,
    Monitor,
}

/// Outcome of the bedtime safety check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreSleepEvaluation {
    pub action: PreSleepAction,
    /// Correction insulin to take now, 0 unless `action` is `SmallCorrection`.
    pub correction_dose: f64,
    pub snack: bool,
    /// Suggested snack size in grams, only set with `EatSnack`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbohydrates: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<Message>,
}

/// Evaluate glucose and active insulin before sleep.
///
/// Corrections use the fixed 140 mg/dL sleep target and only 70% of the
/// computed amount; anything at or below 0.5 U is not worth dosing at
/// bedtime and degrades to monitoring.
pub fn evaluate_pre_sleep(
    glucose: f64,
    injections: &[Injection],
    now: DateTime<Utc>,
    dia_hours: f64,
    isf: f64,
) -> PreSleepEvaluation {
    let iob = calculate_iob(injections, now, dia_hours);

    if glucose < 100.0 || (glucose < 120.0 && iob > 1.0) {
        tracing::debug!(glucose, iob, "pre-sleep: snack advised");
        return PreSleepEvaluation {
            action: PreSleepAction::EatSnack,
            correction_dose: 0.0,
            snack: true,
            carbohydrates: Some(SNACK_CARBOHYDRATES_G),
            warning: Some(Message::NocturnalHypoglycemiaRisk),
        };
    }

    if glucose > 250.0 {
        let correction = (glucose - SLEEP_TARGET_MG_DL) / isf - iob;
        if correction > 0.5 {
            return PreSleepEvaluation {
                action: PreSleepAction::SmallCorrection,
                correction_dose: round_to_half_unit(correction * 0.7),
                snack: false,
                carbohydrates: None,
                warning: Some(Message::CheckKetones),
            };
        }
        // Active insulin already covers most of it; dose would round away
        return PreSleepEvaluation {
            action: PreSleepAction::Monitor,
            correction_dose: 0.0,
            snack: false,
            carbohydrates: None,
            warning: Some(Message::CheckKetones),
        };
    }

    if (180.0..=250.0).contains(&glucose) {
        return PreSleepEvaluation {
            action: PreSleepAction::Monitor,
            correction_dose: 0.0,
            snack: false,
            carbohydrates: None,
            warning: Some(Message::MonitorOvernight),
        };
    }

    PreSleepEvaluation {
        action: PreSleepAction::Sleep,
        correction_dose: 0.0,
        snack: false,
        carbohydrates: None,
        warning: None,
    }
}

// ============================================================================
// Between-Meal Correction
// ============================================================================

/// Outcome of a between-meal correction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionOutcome {
    pub dose: f64,
    pub reason: Message,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_action: Option<Message>,
    /// Insulin still active, rounded to 2 decimals.
    pub iob: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precaution: Option<Message>,
}

/// Conservative correction between meals.
///
/// The 3-hour rule is enforced first. The target is padded by 20% and the
/// computed correction halved (the "50% rule"); a warranted correction is
/// never below the 0.5 U pen resolution.
pub fn between_meal_correction(
    glucose: f64,
    target_glucose: f64,
    injections: &[Injection],
    now: DateTime<Utc>,
    dia_hours: f64,
    isf: f64,
) -> CorrectionOutcome {
    let iob = calculate_iob(injections, now, dia_hours);

    if !check_three_hour_rule(injections, now) {
        let hours_elapsed = hours_since_last_injection(injections, now).unwrap_or(0.0);
        let hours_remaining = (MINIMUM_DOSE_INTERVAL_HOURS - hours_elapsed).max(0.0);
        tracing::debug!(hours_elapsed, "correction blocked by 3-hour rule");
        return CorrectionOutcome {
            dose: 0.0,
            reason: Message::CorrectionTooSoon {
                hours_elapsed: round_decimals(hours_elapsed, 1),
            },
            recommended_action: Some(Message::WaitBeforeNewCorrection {
                hours_remaining: round_decimals(hours_remaining, 1),
            }),
            iob: round_decimals(iob, 2),
            precaution: None,
        };
    }

    let correction = (glucose - target_glucose * 1.2) / isf - iob;
    if correction > 0.0 {
        let dose = round_to_half_unit(correction * 0.5).max(0.5);
        return CorrectionOutcome {
            dose,
            reason: Message::CorrectionHalvedForSafety,
            recommended_action: None,
            iob: round_decimals(iob, 2),
            precaution: Some(Message::RecheckAfterCorrection { minutes: 90 }),
        };
    }

    CorrectionOutcome {
        dose: 0.0,
        reason: Message::NoCorrectionNeeded,
        recommended_action: None,
        iob: round_decimals(iob, 2),
        precaution: None,
    }
}

// ============================================================================
// Warnings
// ============================================================================

/// Advisory warnings for a computed dose.
///
/// Every check runs; none are mutually exclusive. Order is stable:
/// glucose safety first, dose size second, context notes last.
pub fn generate_warnings(
    glucose: f64,
    iob: f64,
    dose: f64,
    carbohydrates: f64,
    context: &DoseContext,
) -> Vec<Message> {
    let mut warnings = Vec::new();

    if glucose < 70.0 {
        warnings.push(Message::Hypoglycemia { glucose });
    }
    if glucose < 100.0 && iob > 1.0 {
        warnings.push(Message::HighIobLowGlucose {
            iob: round_decimals(iob, 2),
            glucose,
        });
    }
    if glucose > 300.0 {
        warnings.push(Message::VeryHighGlucose { glucose });
    }
    if dose == 0.0 && carbohydrates > 0.0 {
        warnings.push(Message::CarbsWithoutInsulin { carbohydrates });
    }
    if context.hour_of_day.is_some_and(|hour| hour >= 22) && dose > 5.0 {
        warnings.push(Message::HighNocturnalDose { dose });
    }
    if dose > 15.0 {
        warnings.push(Message::VeryHighDose { dose });
    }

    if context.recent_exercise {
        warnings.push(Message::ExerciseAdjustment);
    }
    if context.alcohol {
        warnings.push(Message::AlcoholAdjustment);
    }
    if context.high_fat_meal {
        warnings.push(Message::HighFatMealAdjustment);
    }
    if context.illness {
        warnings.push(Message::IllnessAdjustment);
    }
    if context.stress {
        warnings.push(Message::StressAdjustment);
    }
    if context.menstruation {
        warnings.push(Message::MenstruationAdjustment);
    }

    warnings
}
