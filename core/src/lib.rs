//! Insulin Assistant Core Library
//!
//! Pure dose-computation engine for a multiple-daily-injection (MDI)
//! workflow: insulin- and carbs-on-board decay, prandial plus correction
//! dosing with contextual safety adjustments, and retrospective model
//! validation over multi-day glucose records.
//!
//! # Design Principles
//!
//! 1. **Pure Functions**: every operation is a side-effect-free
//!    computation over caller-supplied immutable inputs
//! 2. **Single Clock**: one `now` parameter threads through every decay
//!    calculation; identical inputs give bit-identical outputs
//! 3. **Clamp, Don't Throw**: out-of-window deltas, negative corrections,
//!    and over-reduced doses clamp to zero instead of erroring
//! 4. **Structured Messages**: warnings and recommendations are semantic
//!    keys plus parameters, localized through a caller-injected seam

pub mod analysis;
pub mod cob;
pub mod dose;
pub mod errors;
pub mod iob;
pub mod messages;
pub mod numeric;
pub mod safety;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::EngineError;
pub use messages::{EnglishMessages, Localizer, Message};
pub use types::*;

pub use analysis::{
    analyze_patterns, generate_adjustment_recommendation, summarize_day, validate_weekly_model,
    DaySummary, PatternFinding, PatternKind, PatternReport, ValidationResult,
};
pub use cob::{
    calculate_cob, calculate_remaining_cob, cob_breakdown, percentage_absorbed, CobBreakdown,
    MealOnBoard,
};
pub use dose::{
    calculate_breakfast_dose, calculate_correction_dose, calculate_dinner_dose, calculate_dose,
    calculate_lunch_dose, DoseBreakdown, DoseResult,
};
pub use iob::{calculate_iob, calculate_remaining_iob, is_safe_for_new_dose};
pub use safety::{
    apply_safety_factor, between_meal_correction, check_three_hour_rule, evaluate_pre_sleep,
    generate_warnings, CorrectionOutcome, PreSleepAction, PreSleepEvaluation,
};
