//! Core value objects for the dosing engine.
//!
//! Every type here is an immutable input or output: the caller builds it
//! from stored data for one calculation, the engine never mutates it, and
//! nothing survives the call. Timestamps are `DateTime<Utc>`; a single
//! `now` parameter is threaded through every time-dependent computation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Glucose Classification
// ============================================================================

/// Lower bound of the clinically acceptable glucose band (mg/dL).
pub const HYPO_THRESHOLD_MG_DL: f64 = 70.0;
/// Upper bound of the clinically acceptable glucose band (mg/dL).
pub const HYPER_THRESHOLD_MG_DL: f64 = 180.0;

/// Classification of a glucose reading against the 70–180 mg/dL band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlucoseCategory {
    Hypoglycemia,
    InRange,
    Hyperglycemia,
}

/// Classify a glucose reading. The band is inclusive on both ends.
pub fn classify_glucose(glucose: f64) -> GlucoseCategory {
    if glucose < HYPO_THRESHOLD_MG_DL {
        GlucoseCategory::Hypoglycemia
    } else if glucose > HYPER_THRESHOLD_MG_DL {
        GlucoseCategory::Hyperglycemia
    } else {
        GlucoseCategory::InRange
    }
}

// ============================================================================
// Insulin Profile
// ============================================================================

/// Meal slots that carry their own insulin-to-carbohydrate ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
}

/// Dose calculation slots. `Correction` is a carb-free dose between meals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoseSlot {
    Breakfast,
    Lunch,
    Dinner,
    Correction,
}

impl DoseSlot {
    /// Meal slot whose IC ratio applies to this dose.
    ///
    /// Corrections carry no carbohydrates, so they borrow the lunch ratio
    /// as a neutral default.
    pub fn ic_slot(&self) -> MealSlot {
        match self {
            DoseSlot::Breakfast => MealSlot::Breakfast,
            DoseSlot::Lunch | DoseSlot::Correction => MealSlot::Lunch,
            DoseSlot::Dinner => MealSlot::Dinner,
        }
    }
}

/// Insulin-to-carbohydrate ratios per meal slot (grams covered per unit).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IcRatioTable {
    pub breakfast: f64,
    pub lunch: f64,
    pub dinner: f64,
}

impl IcRatioTable {
    pub fn for_slot(&self, slot: MealSlot) -> f64 {
        match slot {
            MealSlot::Breakfast => self.breakfast,
            MealSlot::Lunch => self.lunch,
            MealSlot::Dinner => self.dinner,
        }
    }
}

/// A patient's dosing parameters, supplied fresh for every calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsulinProfile {
    /// Insulin sensitivity factor: mg/dL lowered per unit.
    pub isf: f64,
    /// Grams of carbohydrate covered per unit, by meal slot.
    pub ic_ratio: IcRatioTable,
    /// Duration of insulin action in hours (typically 3–5).
    pub dia_hours: f64,
    /// Daytime target glucose in mg/dL.
    pub target: f64,
}

// ============================================================================
// Histories
// ============================================================================

/// A past insulin injection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Injection {
    pub timestamp: DateTime<Utc>,
    pub units: f64,
}

impl Injection {
    /// Hours elapsed between this injection and `now`. Negative for
    /// future-dated entries.
    pub fn hours_before(&self, now: DateTime<Utc>) -> f64 {
        (now - self.timestamp).num_milliseconds() as f64 / 3_600_000.0
    }
}

/// Carbohydrate absorption speed, mapped to a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MealAbsorption {
    /// Juice, glucose tabs
    Fast,
    /// Mixed meal
    #[default]
    Normal,
    /// High protein
    Slow,
    /// High fat, restaurant meals
    VerySlow,
}

impl MealAbsorption {
    /// Hours until the meal is fully absorbed.
    pub fn duration_hours(&self) -> f64 {
        match self {
            MealAbsorption::Fast => 3.0,
            MealAbsorption::Normal => 4.0,
            MealAbsorption::Slow => 5.0,
            MealAbsorption::VerySlow => 6.0,
        }
    }
}

/// A past meal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub timestamp: DateTime<Utc>,
    /// Carbohydrate content in grams.
    pub carbohydrates: f64,
    #[serde(default)]
    pub absorption: MealAbsorption,
}

impl Meal {
    pub fn hours_before(&self, now: DateTime<Utc>) -> f64 {
        (now - self.timestamp).num_milliseconds() as f64 / 3_600_000.0
    }
}

// ============================================================================
// Dose Context
// ============================================================================

/// Situational factors that scale a computed dose.
///
/// Fully specified with defaults rather than an optional bag: the
/// multiplier composition is total, and flags are never mutually
/// exclusive — every active factor applies multiplicatively.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct DoseContext {
    #[serde(default)]
    pub recent_exercise: bool,
    #[serde(default)]
    pub alcohol: bool,
    #[serde(default)]
    pub illness: bool,
    #[serde(default)]
    pub stress: bool,
    #[serde(default)]
    pub menstruation: bool,
    #[serde(default)]
    pub high_fat_meal: bool,
    /// Local hour of day, 0–23. `None` when the caller has no clock context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour_of_day: Option<u32>,
}

/// A contextual factor with its dose multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextFactor {
    Exercise,
    Alcohol,
    Illness,
    Stress,
    Menstruation,
    Nocturnal,
    HighFatMeal,
}

impl ContextFactor {
    /// Multiplier applied to the computed dose when this factor is active.
    pub fn multiplier(&self) -> f64 {
        match self {
            ContextFactor::Exercise => 0.8,
            ContextFactor::Alcohol => 0.7,
            ContextFactor::Illness => 1.2,
            ContextFactor::Stress => 1.1,
            ContextFactor::Menstruation => 1.1,
            ContextFactor::Nocturnal => 0.95,
            ContextFactor::HighFatMeal => 0.85,
        }
    }
}

/// One applied adjustment, reported in the dose breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoseAdjustment {
    pub factor: ContextFactor,
    /// Percent change relative to the unadjusted dose, e.g. -20 for exercise.
    pub percent: i32,
}

impl From<ContextFactor> for DoseAdjustment {
    fn from(factor: ContextFactor) -> Self {
        DoseAdjustment {
            factor,
            percent: ((factor.multiplier() - 1.0) * 100.0).round() as i32,
        }
    }
}

// ============================================================================
// Dose Input
// ============================================================================

/// Input for one dose calculation, assembled by the service tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseInput {
    pub slot: DoseSlot,
    /// Current glucose in mg/dL.
    pub glucose: f64,
    /// Carbohydrates about to be eaten, in grams.
    #[serde(default)]
    pub carbohydrates: f64,
    #[serde(default)]
    pub previous_injections: Vec<Injection>,
    #[serde(default)]
    pub context: DoseContext,
}

// ============================================================================
// Glucose Records
// ============================================================================

/// One historical glucose measurement, optionally annotated with the
/// treatment given and the reading three hours later.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlucoseMeasurement {
    pub timestamp: DateTime<Utc>,
    /// Glucose at measurement time, mg/dL.
    pub glucose: f64,
    /// Post-treatment glucose, used for model validation when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glucose_3h_later: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insulin_units: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbohydrates: Option<f64>,
}

impl GlucoseMeasurement {
    /// The value the validator scores: the 3-hour outcome when recorded,
    /// the raw reading otherwise.
    pub fn effective_glucose(&self) -> f64 {
        self.glucose_3h_later.unwrap_or(self.glucose)
    }
}

/// All measurements recorded on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub measurements: Vec<GlucoseMeasurement>,
}
