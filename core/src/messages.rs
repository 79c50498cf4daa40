//! Structured messages and the localization seam.
//!
//! The engine never hard-codes display text into its results. Every
//! warning, reason, recommendation, and suggestion is a [`Message`]
//! variant carrying its parameters; the caller localizes through a
//! [`Localizer`] it supplies per request. [`EnglishMessages`] is the
//! bundled reference implementation.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A semantic message key plus its parameters.
///
/// Serializes with the variant name as tag, so the service tier can also
/// ship these to a client-side translation layer untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Message {
    // Dose warnings
    Hypoglycemia { glucose: f64 },
    HighIobLowGlucose { iob: f64, glucose: f64 },
    VeryHighGlucose { glucose: f64 },
    CarbsWithoutInsulin { carbohydrates: f64 },
    HighNocturnalDose { dose: f64 },
    VeryHighDose { dose: f64 },
    ExerciseAdjustment,
    AlcoholAdjustment,
    HighFatMealAdjustment,
    IllnessAdjustment,
    StressAdjustment,
    MenstruationAdjustment,
    DoseReducedByFactors { percent: i32 },

    // Pre-sleep evaluation
    NocturnalHypoglycemiaRisk,
    CheckKetones,
    MonitorOvernight,

    // Between-meal correction
    CorrectionTooSoon { hours_elapsed: f64 },
    WaitBeforeNewCorrection { hours_remaining: f64 },
    NoCorrectionNeeded,
    CorrectionHalvedForSafety,
    RecheckAfterCorrection { minutes: u32 },

    // Model validation recommendations
    UrgentHypoglycemiaAdjustment { hypo_rate: f64 },
    FrequentHypoglycemiaCaution { hypo_rate: f64 },
    PoorControlReview { days_in_range: f64 },
    PoorControlHyperglycemiaReview { days_in_range: f64, hyper_rate: f64 },
    ModerateControl { days_in_range: f64 },
    ModerateControlHyperglycemia { days_in_range: f64, hyper_rate: f64 },
    ExcellentControl,
    ModelWorkingWell,
    ContinueMonitoring,

    // Pattern analysis
    RecurringHypoglycemiaPattern { hour: u32, count: usize },
    RecurringHyperglycemiaPattern { hour: u32, average: f64 },
    HighVariability { std_dev: f64 },
    NoPatternsDetected,
    LowerDoseAroundHour { hour: u32 },
    ReviewCoverageAroundHour { hour: u32 },
    StabilizeRoutine,
    KeepCurrentRoutine,
}

impl Message {
    /// Stable message key for translation catalogs.
    pub fn key(&self) -> &'static str {
        match self {
            Message::Hypoglycemia { .. } => "warnings.hypoglycemia",
            Message::HighIobLowGlucose { .. } => "warnings.high_iob_low_glucose",
            Message::VeryHighGlucose { .. } => "warnings.very_high_glucose",
            Message::CarbsWithoutInsulin { .. } => "warnings.carbs_without_insulin",
            Message::HighNocturnalDose { .. } => "warnings.high_nocturnal_dose",
            Message::VeryHighDose { .. } => "warnings.very_high_dose",
            Message::ExerciseAdjustment => "warnings.exercise_adjustment",
            Message::AlcoholAdjustment => "warnings.alcohol_adjustment",
            Message::HighFatMealAdjustment => "warnings.high_fat_meal_adjustment",
            Message::IllnessAdjustment => "warnings.illness_adjustment",
            Message::StressAdjustment => "warnings.stress_adjustment",
            Message::MenstruationAdjustment => "warnings.menstruation_adjustment",
            Message::DoseReducedByFactors { .. } => "warnings.dose_reduced_by_factors",
            Message::NocturnalHypoglycemiaRisk => "presleep.nocturnal_hypoglycemia_risk",
            Message::CheckKetones => "presleep.check_ketones",
            Message::MonitorOvernight => "presleep.monitor_overnight",
            Message::CorrectionTooSoon { .. } => "correction.too_soon",
            Message::WaitBeforeNewCorrection { .. } => "correction.wait_before_new",
            Message::NoCorrectionNeeded => "correction.none_needed",
            Message::CorrectionHalvedForSafety => "correction.halved_for_safety",
            Message::RecheckAfterCorrection { .. } => "correction.recheck_after",
            Message::UrgentHypoglycemiaAdjustment { .. } => "validation.urgent_hypoglycemia_adjustment",
            Message::FrequentHypoglycemiaCaution { .. } => "validation.frequent_hypoglycemia_caution",
            Message::PoorControlReview { .. } => "validation.poor_control_review",
            Message::PoorControlHyperglycemiaReview { .. } => "validation.poor_control_hyperglycemia_review",
            Message::ModerateControl { .. } => "validation.moderate_control",
            Message::ModerateControlHyperglycemia { .. } => "validation.moderate_control_hyperglycemia",
            Message::ExcellentControl => "validation.excellent_control",
            Message::ModelWorkingWell => "validation.model_working",
            Message::ContinueMonitoring => "validation.continue_monitoring",
            Message::RecurringHypoglycemiaPattern { .. } => "patterns.recurring_hypoglycemia",
            Message::RecurringHyperglycemiaPattern { .. } => "patterns.recurring_hyperglycemia",
            Message::HighVariability { .. } => "patterns.high_variability",
            Message::NoPatternsDetected => "patterns.none_detected",
            Message::LowerDoseAroundHour { .. } => "suggestions.lower_dose_around_hour",
            Message::ReviewCoverageAroundHour { .. } => "suggestions.review_coverage_around_hour",
            Message::StabilizeRoutine => "suggestions.stabilize_routine",
            Message::KeepCurrentRoutine => "suggestions.keep_current_routine",
        }
    }

    /// Parameters as a JSON object, keyed the way translation catalogs
    /// expect them.
    pub fn params(&self) -> Value {
        match self {
            Message::Hypoglycemia { glucose } => json!({ "glucose": glucose }),
            Message::HighIobLowGlucose { iob, glucose } => {
                json!({ "iob": iob, "glucose": glucose })
            }
            Message::VeryHighGlucose { glucose } => json!({ "glucose": glucose }),
            Message::CarbsWithoutInsulin { carbohydrates } => {
                json!({ "carbohydrates": carbohydrates })
            }
            Message::HighNocturnalDose { dose } => json!({ "dose": dose }),
            Message::VeryHighDose { dose } => json!({ "dose": dose }),
            Message::DoseReducedByFactors { percent } => json!({ "percent": percent }),
            Message::CorrectionTooSoon { hours_elapsed } => {
                json!({ "hours_elapsed": hours_elapsed })
            }
            Message::WaitBeforeNewCorrection { hours_remaining } => {
                json!({ "hours_remaining": hours_remaining })
            }
            Message::RecheckAfterCorrection { minutes } => json!({ "minutes": minutes }),
            Message::UrgentHypoglycemiaAdjustment { hypo_rate } => {
                json!({ "hypo_rate": hypo_rate })
            }
            Message::FrequentHypoglycemiaCaution { hypo_rate } => {
                json!({ "hypo_rate": hypo_rate })
            }
            Message::PoorControlReview { days_in_range } => {
                json!({ "days_in_range": days_in_range })
            }
            Message::PoorControlHyperglycemiaReview {
                days_in_range,
                hyper_rate,
            } => json!({ "days_in_range": days_in_range, "hyper_rate": hyper_rate }),
            Message::ModerateControl { days_in_range } => {
                json!({ "days_in_range": days_in_range })
            }
            Message::ModerateControlHyperglycemia {
                days_in_range,
                hyper_rate,
            } => json!({ "days_in_range": days_in_range, "hyper_rate": hyper_rate }),
            Message::RecurringHypoglycemiaPattern { hour, count } => {
                json!({ "hour": hour, "count": count })
            }
            Message::RecurringHyperglycemiaPattern { hour, average } => {
                json!({ "hour": hour, "average": average })
            }
            Message::HighVariability { std_dev } => json!({ "std_dev": std_dev }),
            Message::LowerDoseAroundHour { hour } => json!({ "hour": hour }),
            Message::ReviewCoverageAroundHour { hour } => json!({ "hour": hour }),
            _ => json!({}),
        }
    }
}

/// Localization seam injected by the caller.
///
/// The service tier typically wraps its translation catalog; tests and
/// single-language deployments can use [`EnglishMessages`] directly.
pub trait Localizer {
    fn localize(&self, message: &Message) -> String;
}

/// Built-in English templates. Calm, preparatory framing; no alarm wording.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishMessages;

impl Localizer for EnglishMessages {
    fn localize(&self, message: &Message) -> String {
        match message {
            Message::Hypoglycemia { glucose } => format!(
                "Your glucose is {glucose:.0} mg/dL, below 70. Treat the low before taking any insulin."
            ),
            Message::HighIobLowGlucose { iob, glucose } => format!(
                "You still have {iob:.1} U of insulin active and your glucose is {glucose:.0} mg/dL. \
                 Consider waiting or eating before dosing again."
            ),
            Message::VeryHighGlucose { glucose } => format!(
                "Your glucose is {glucose:.0} mg/dL. Recheck in an hour and keep water nearby."
            ),
            Message::CarbsWithoutInsulin { carbohydrates } => format!(
                "You logged {carbohydrates:.0} g of carbohydrate but no insulin is suggested. \
                 Double-check the meal entry."
            ),
            Message::HighNocturnalDose { dose } => format!(
                "{dose:.1} U is a large dose this late in the evening. \
                 Consider a bedtime glucose check."
            ),
            Message::VeryHighDose { dose } => format!(
                "{dose:.1} U is unusually large. Please verify the carbohydrate estimate before injecting."
            ),
            Message::ExerciseAdjustment => {
                "Dose lowered because of recent exercise.".to_string()
            }
            Message::AlcoholAdjustment => {
                "Dose lowered because alcohol raises the risk of delayed lows.".to_string()
            }
            Message::HighFatMealAdjustment => {
                "Dose lowered for a high-fat meal; absorption will be slower.".to_string()
            }
            Message::IllnessAdjustment => {
                "Dose raised because illness tends to increase insulin resistance.".to_string()
            }
            Message::StressAdjustment => {
                "Dose raised slightly to account for stress.".to_string()
            }
            Message::MenstruationAdjustment => {
                "Dose raised slightly to account for cycle-related resistance.".to_string()
            }
            Message::DoseReducedByFactors { percent } => format!(
                "The suggested dose was reduced by {percent}% for the factors you reported. \
                 Recheck your glucose in a couple of hours."
            ),
            Message::NocturnalHypoglycemiaRisk => {
                "There is a risk of low glucose overnight. Eat a snack before sleeping.".to_string()
            }
            Message::CheckKetones => {
                "Your glucose is very high before bed. Check for ketones and recheck glucose overnight."
                    .to_string()
            }
            Message::MonitorOvernight => {
                "Glucose is elevated. Watch the trend and consider a check around 3 AM.".to_string()
            }
            Message::CorrectionTooSoon { hours_elapsed } => format!(
                "Your last injection was {hours_elapsed:.1} h ago. Wait until 3 h have passed \
                 before correcting again."
            ),
            Message::WaitBeforeNewCorrection { hours_remaining } => format!(
                "Recheck in about {hours_remaining:.1} h; insulin from the last dose is still working."
            ),
            Message::NoCorrectionNeeded => {
                "No correction is needed right now.".to_string()
            }
            Message::CorrectionHalvedForSafety => {
                "Between meals only half the computed correction is suggested, for safety.".to_string()
            }
            Message::RecheckAfterCorrection { minutes } => format!(
                "Recheck your glucose about {minutes} minutes after this correction."
            ),
            Message::UrgentHypoglycemiaAdjustment { hypo_rate } => format!(
                "{:.0}% of readings were low. The dosing model needs adjustment; \
                 please review it with your care team soon.",
                hypo_rate * 100.0
            ),
            Message::FrequentHypoglycemiaCaution { hypo_rate } => format!(
                "{:.0}% of readings were low. Consider slightly more conservative doses.",
                hypo_rate * 100.0
            ),
            Message::PoorControlReview { days_in_range } => format!(
                "Only {:.0}% of days were in range. A review of the dosing model would help.",
                days_in_range * 100.0
            ),
            Message::PoorControlHyperglycemiaReview {
                days_in_range,
                hyper_rate,
            } => format!(
                "Only {:.0}% of days were in range and {:.0}% of readings were high. \
                 A review of carbohydrate ratios would help.",
                days_in_range * 100.0,
                hyper_rate * 100.0
            ),
            Message::ModerateControl { days_in_range } => format!(
                "{:.0}% of days were in range. There is room to fine-tune the model.",
                days_in_range * 100.0
            ),
            Message::ModerateControlHyperglycemia {
                days_in_range,
                hyper_rate,
            } => format!(
                "{:.0}% of days were in range with {:.0}% high readings. \
                 Optimizing meal coverage could help.",
                days_in_range * 100.0,
                hyper_rate * 100.0
            ),
            Message::ExcellentControl => {
                "Excellent control this week. Keep the current model.".to_string()
            }
            Message::ModelWorkingWell => {
                "The dosing model is working well. Keep the current routine.".to_string()
            }
            Message::ContinueMonitoring => {
                "Keep monitoring; there is not enough signal to suggest a change.".to_string()
            }
            Message::RecurringHypoglycemiaPattern { hour, count } => format!(
                "Low glucose showed up {count} times around {hour:02}:00. \
                 This looks like a recurring pattern."
            ),
            Message::RecurringHyperglycemiaPattern { hour, average } => format!(
                "Glucose averages {average:.0} mg/dL around {hour:02}:00. \
                 This looks like a recurring pattern."
            ),
            Message::HighVariability { std_dev } => format!(
                "Glucose swings widely (standard deviation {std_dev:.0} mg/dL)."
            ),
            Message::NoPatternsDetected => {
                "No recurring glucose patterns were found this week.".to_string()
            }
            Message::LowerDoseAroundHour { hour } => format!(
                "Consider a smaller dose for meals or corrections near {hour:02}:00."
            ),
            Message::ReviewCoverageAroundHour { hour } => format!(
                "Consider reviewing carbohydrate coverage for meals near {hour:02}:00."
            ),
            Message::StabilizeRoutine => {
                "More consistent meal times and correction habits would reduce the swings.".to_string()
            }
            Message::KeepCurrentRoutine => "Keep the current routine.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_namespaced() {
        assert_eq!(
            Message::Hypoglycemia { glucose: 55.0 }.key(),
            "warnings.hypoglycemia"
        );
        assert_eq!(Message::CheckKetones.key(), "presleep.check_ketones");
        assert_eq!(
            Message::CorrectionTooSoon { hours_elapsed: 1.5 }.key(),
            "correction.too_soon"
        );
        assert_eq!(Message::ExcellentControl.key(), "validation.excellent_control");
        assert_eq!(
            Message::RecurringHypoglycemiaPattern { hour: 3, count: 2 }.key(),
            "patterns.recurring_hypoglycemia"
        );
    }

    #[test]
    fn test_params_carry_values() {
        let msg = Message::HighIobLowGlucose {
            iob: 1.5,
            glucose: 92.0,
        };
        let params = msg.params();
        assert_eq!(params["iob"], 1.5);
        assert_eq!(params["glucose"], 92.0);

        assert_eq!(Message::ExcellentControl.params(), serde_json::json!({}));
    }

    #[test]
    fn test_english_templates_interpolate() {
        let text = EnglishMessages.localize(&Message::CorrectionTooSoon { hours_elapsed: 1.5 });
        assert!(text.contains("1.5"));

        let text = EnglishMessages.localize(&Message::RecurringHypoglycemiaPattern {
            hour: 3,
            count: 4,
        });
        assert!(text.contains("03:00"));
        assert!(text.contains('4'));
    }

    #[test]
    fn test_message_serializes_with_tag() {
        let msg = Message::DoseReducedByFactors { percent: 30 };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["dose_reduced_by_factors"]["percent"], 30);
    }
}
