//! Retrospective model validation and pattern analysis.
//!
//! Scores a multi-day glucose record against the 70–180 mg/dL band,
//! derives a priority-ordered adjustment recommendation, and looks for
//! hour-of-day clusters of recurring lows or highs. Measurements with a
//! recorded 3-hour outcome are scored on that outcome; the rest on the
//! raw reading.

use std::collections::BTreeMap;

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use crate::messages::Message;
use crate::numeric::round_decimals;
use crate::types::{classify_glucose, DayRecord, GlucoseCategory};

// ============================================================================
// Weekly Validation
// ============================================================================

/// Classification counts for one day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub total: usize,
    pub in_range: usize,
    pub hypo: usize,
    pub hyper: usize,
    /// Fraction of the day's measurements inside the band; 0 for empty days.
    pub in_range_fraction: f64,
}

/// Aggregate verdict over the analyzed window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Fraction of days with at least 70% of readings in range.
    pub days_in_range: f64,
    /// Fraction of all measurements below 70 mg/dL.
    pub hypoglycemia_rate: f64,
    /// Fraction of all measurements above 180 mg/dL.
    pub hyperglycemia_rate: f64,
    pub recommendation: Message,
}

/// Count a single day's classifications.
pub fn summarize_day(day: &DayRecord) -> DaySummary {
    let mut in_range = 0;
    let mut hypo = 0;
    let mut hyper = 0;
    for measurement in &day.measurements {
        match classify_glucose(measurement.effective_glucose()) {
            GlucoseCategory::InRange => in_range += 1,
            GlucoseCategory::Hypoglycemia => hypo += 1,
            GlucoseCategory::Hyperglycemia => hyper += 1,
        }
    }
    let total = day.measurements.len();
    DaySummary {
        total,
        in_range,
        hypo,
        hyper,
        in_range_fraction: if total == 0 {
            0.0
        } else {
            in_range as f64 / total as f64
        },
    }
}

/// Validate the dosing model over a window of day records.
///
/// A day counts as "in range" when at least 70% of its measurements fall
/// inside the band. Days with no measurements carry no evidence and are
/// excluded from the day denominator. All three output fractions are
/// rounded to 2 decimals.
pub fn validate_weekly_model(days: &[DayRecord]) -> ValidationResult {
    let summaries: Vec<DaySummary> = days.iter().map(summarize_day).collect();
    let scored: Vec<&DaySummary> = summaries.iter().filter(|s| s.total > 0).collect();

    let total_measurements: usize = scored.iter().map(|s| s.total).sum();
    let hypo_total: usize = scored.iter().map(|s| s.hypo).sum();
    let hyper_total: usize = scored.iter().map(|s| s.hyper).sum();

    let days_in_range = if scored.is_empty() {
        0.0
    } else {
        scored.iter().filter(|s| s.in_range_fraction >= 0.7).count() as f64 / scored.len() as f64
    };
    let hypoglycemia_rate = if total_measurements == 0 {
        0.0
    } else {
        hypo_total as f64 / total_measurements as f64
    };
    let hyperglycemia_rate = if total_measurements == 0 {
        0.0
    } else {
        hyper_total as f64 / total_measurements as f64
    };

    let days_in_range = round_decimals(days_in_range, 2);
    let hypoglycemia_rate = round_decimals(hypoglycemia_rate, 2);
    let hyperglycemia_rate = round_decimals(hyperglycemia_rate, 2);

    tracing::debug!(
        days = scored.len(),
        days_in_range,
        hypoglycemia_rate,
        hyperglycemia_rate,
        "weekly model validated"
    );

    ValidationResult {
        days_in_range,
        hypoglycemia_rate,
        hyperglycemia_rate,
        recommendation: generate_adjustment_recommendation(
            days_in_range,
            hypoglycemia_rate,
            hyperglycemia_rate,
        ),
    }
}

/// Priority-ordered recommendation; the first matching tier wins.
///
/// Hypoglycemia outranks everything: frequent lows are more dangerous
/// than an equal amount of highs.
pub fn generate_adjustment_recommendation(
    days_in_range: f64,
    hypo_rate: f64,
    hyper_rate: f64,
) -> Message {
    if hypo_rate > 0.10 {
        Message::UrgentHypoglycemiaAdjustment { hypo_rate }
    } else if hypo_rate > 0.05 {
        Message::FrequentHypoglycemiaCaution { hypo_rate }
    } else if days_in_range < 0.50 {
        if hyper_rate > 0.4 {
            Message::PoorControlHyperglycemiaReview {
                days_in_range,
                hyper_rate,
            }
        } else {
            Message::PoorControlReview { days_in_range }
        }
    } else if days_in_range < 0.70 {
        if hyper_rate > 0.3 {
            Message::ModerateControlHyperglycemia {
                days_in_range,
                hyper_rate,
            }
        } else {
            Message::ModerateControl { days_in_range }
        }
    } else if hypo_rate < 0.05 {
        if hypo_rate == 0.0 && hyper_rate < 0.1 {
            Message::ExcellentControl
        } else {
            Message::ModelWorkingWell
        }
    } else {
        Message::ContinueMonitoring
    }
}

// ============================================================================
// Pattern Analysis
// ============================================================================

/// Kind of recurring pattern detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    RecurringHypoglycemia,
    RecurringHyperglycemia,
    HighVariability,
    NoPatterns,
}

/// One detected pattern with its suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternFinding {
    pub kind: PatternKind,
    /// Hour-of-day bucket the pattern clusters in, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
    pub message: Message,
    pub suggestion: Message,
}

/// All patterns found in the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternReport {
    pub findings: Vec<PatternFinding>,
    /// Standard deviation across every measurement in the window,
    /// rounded to 2 decimals.
    pub glucose_std_dev: f64,
}

/// Detect hour-of-day clusters of lows and highs plus overall variability.
///
/// Buckets need at least 2 samples before they can flag anything; a
/// single bad reading at some hour is not a pattern.
pub fn analyze_patterns(days: &[DayRecord]) -> PatternReport {
    let mut buckets: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    let mut all_values: Vec<f64> = Vec::new();

    for day in days {
        for measurement in &day.measurements {
            let glucose = measurement.effective_glucose();
            buckets
                .entry(measurement.timestamp.hour())
                .or_default()
                .push(glucose);
            all_values.push(glucose);
        }
    }

    let mut findings = Vec::new();

    for (&hour, values) in &buckets {
        if values.len() < 2 {
            continue;
        }
        let count = values.len() as f64;
        let hypo = values.iter().filter(|&&g| g < 70.0).count();
        let hyper = values.iter().filter(|&&g| g > 180.0).count();
        let mean = values.iter().sum::<f64>() / count;

        if hypo >= 2 || hypo as f64 / count > 0.4 {
            findings.push(PatternFinding {
                kind: PatternKind::RecurringHypoglycemia,
                hour: Some(hour),
                message: Message::RecurringHypoglycemiaPattern { hour, count: hypo },
                suggestion: Message::LowerDoseAroundHour { hour },
            });
        }
        if (hyper >= 2 || hyper as f64 / count > 0.5) && mean > 200.0 {
            findings.push(PatternFinding {
                kind: PatternKind::RecurringHyperglycemia,
                hour: Some(hour),
                message: Message::RecurringHyperglycemiaPattern {
                    hour,
                    average: round_decimals(mean, 2),
                },
                suggestion: Message::ReviewCoverageAroundHour { hour },
            });
        }
    }

    let std_dev = round_decimals(standard_deviation(&all_values), 2);
    if std_dev > 50.0 {
        findings.push(PatternFinding {
            kind: PatternKind::HighVariability,
            hour: None,
            message: Message::HighVariability { std_dev },
            suggestion: Message::StabilizeRoutine,
        });
    }

    if findings.is_empty() {
        findings.push(PatternFinding {
            kind: PatternKind::NoPatterns,
            hour: None,
            message: Message::NoPatternsDetected,
            suggestion: Message::KeepCurrentRoutine,
        });
    }

    PatternReport {
        findings,
        glucose_std_dev: std_dev,
    }
}

/// Population standard deviation; 0 for fewer than two values.
fn standard_deviation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GlucoseMeasurement;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rstest::rstest;

    fn day(date: (i32, u32, u32), readings: &[(u32, f64)]) -> DayRecord {
        DayRecord {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            measurements: readings
                .iter()
                .map(|&(hour, glucose)| GlucoseMeasurement {
                    timestamp: Utc
                        .with_ymd_and_hms(date.0, date.1, date.2, hour, 0, 0)
                        .unwrap(),
                    glucose,
                    glucose_3h_later: None,
                    insulin_units: None,
                    carbohydrates: None,
                })
                .collect(),
        }
    }

    // =========================================================================
    // Weekly Validation Tests
    // =========================================================================

    #[test]
    fn test_excellent_week() {
        let days = vec![
            day((2024, 3, 1), &[(8, 100.0), (12, 120.0), (18, 140.0), (22, 150.0)]),
            day((2024, 3, 2), &[(8, 110.0), (12, 125.0), (18, 135.0), (22, 145.0)]),
            day((2024, 3, 3), &[(8, 105.0), (12, 115.0), (18, 130.0), (22, 155.0)]),
        ];
        let result = validate_weekly_model(&days);
        assert_eq!(result.days_in_range, 1.0);
        assert_eq!(result.hypoglycemia_rate, 0.0);
        assert_eq!(result.hyperglycemia_rate, 0.0);
        assert_eq!(result.recommendation, Message::ExcellentControl);
    }

    #[test]
    fn test_good_week_with_some_highs() {
        // 80% in range per day, 20% hyper overall -> model working, not excellent
        let days = vec![
            day((2024, 3, 1), &[(8, 100.0), (12, 120.0), (15, 140.0), (18, 150.0), (22, 200.0)]),
            day((2024, 3, 2), &[(8, 105.0), (12, 118.0), (15, 138.0), (18, 152.0), (22, 210.0)]),
            day((2024, 3, 3), &[(8, 102.0), (12, 122.0), (15, 142.0), (18, 148.0), (22, 205.0)]),
        ];
        let result = validate_weekly_model(&days);
        assert_eq!(result.days_in_range, 1.0);
        assert_eq!(result.hyperglycemia_rate, 0.2);
        assert_eq!(result.recommendation, Message::ModelWorkingWell);
    }

    #[test]
    fn test_poor_week_dominated_by_highs() {
        let days = vec![
            day((2024, 3, 1), &[(8, 200.0), (12, 220.0), (15, 250.0), (18, 300.0), (22, 150.0)]),
            day((2024, 3, 2), &[(8, 210.0), (12, 230.0), (15, 260.0), (18, 290.0), (22, 160.0)]),
            day((2024, 3, 3), &[(8, 220.0), (12, 240.0), (15, 255.0), (18, 310.0), (22, 155.0)]),
        ];
        let result = validate_weekly_model(&days);
        assert_eq!(result.days_in_range, 0.0);
        assert_eq!(result.hyperglycemia_rate, 0.8);
        assert_eq!(
            result.recommendation,
            Message::PoorControlHyperglycemiaReview {
                days_in_range: 0.0,
                hyper_rate: 0.8
            }
        );
    }

    #[test]
    fn test_hypoglycemia_outranks_good_day_fraction() {
        let days = vec![
            day((2024, 3, 1), &[(3, 60.0), (8, 100.0), (12, 110.0), (18, 120.0), (22, 130.0)]),
            day((2024, 3, 2), &[(3, 65.0), (8, 105.0), (12, 115.0), (18, 125.0), (22, 135.0)]),
        ];
        let result = validate_weekly_model(&days);
        // 2 lows out of 10 readings
        assert_eq!(result.hypoglycemia_rate, 0.2);
        assert_eq!(
            result.recommendation,
            Message::UrgentHypoglycemiaAdjustment { hypo_rate: 0.2 }
        );
    }

    #[test]
    fn test_scores_three_hour_outcome_when_recorded() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let days = vec![DayRecord {
            date,
            measurements: vec![GlucoseMeasurement {
                timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
                glucose: 250.0,
                glucose_3h_later: Some(120.0),
                insulin_units: Some(2.0),
                carbohydrates: None,
            }],
        }];
        let result = validate_weekly_model(&days);
        assert_eq!(result.hyperglycemia_rate, 0.0);
        assert_eq!(result.days_in_range, 1.0);
    }

    #[test]
    fn test_empty_days_are_excluded() {
        let days = vec![
            day((2024, 3, 1), &[]),
            day((2024, 3, 2), &[(8, 100.0), (12, 120.0)]),
        ];
        let result = validate_weekly_model(&days);
        assert_eq!(result.days_in_range, 1.0);
    }

    #[test]
    fn test_empty_window_recommends_monitoring() {
        let result = validate_weekly_model(&[]);
        assert_eq!(result.days_in_range, 0.0);
        assert_eq!(result.hypoglycemia_rate, 0.0);
        assert_eq!(result.recommendation, Message::ContinueMonitoring);
    }

    #[rstest]
    #[case(0.9, 0.12, 0.0, "validation.urgent_hypoglycemia_adjustment")]
    #[case(0.9, 0.08, 0.0, "validation.frequent_hypoglycemia_caution")]
    #[case(0.4, 0.0, 0.5, "validation.poor_control_hyperglycemia_review")]
    #[case(0.4, 0.0, 0.2, "validation.poor_control_review")]
    #[case(0.6, 0.0, 0.35, "validation.moderate_control_hyperglycemia")]
    #[case(0.6, 0.0, 0.1, "validation.moderate_control")]
    #[case(0.8, 0.0, 0.05, "validation.excellent_control")]
    #[case(0.8, 0.02, 0.2, "validation.model_working")]
    #[case(0.8, 0.0, 0.2, "validation.model_working")]
    #[case(0.8, 0.05, 0.2, "validation.continue_monitoring")]
    fn test_recommendation_ladder(
        #[case] days_in_range: f64,
        #[case] hypo_rate: f64,
        #[case] hyper_rate: f64,
        #[case] expected_key: &str,
    ) {
        let message = generate_adjustment_recommendation(days_in_range, hypo_rate, hyper_rate);
        assert_eq!(message.key(), expected_key);
    }

    // =========================================================================
    // Pattern Analysis Tests
    // =========================================================================

    #[test]
    fn test_recurring_hypoglycemia_at_same_hour() {
        let days = vec![
            day((2024, 3, 1), &[(3, 60.0), (9, 100.0)]),
            day((2024, 3, 2), &[(3, 65.0), (9, 110.0)]),
        ];
        let report = analyze_patterns(&days);
        assert_eq!(report.findings.len(), 1);
        let finding = &report.findings[0];
        assert_eq!(finding.kind, PatternKind::RecurringHypoglycemia);
        assert_eq!(finding.hour, Some(3));
        assert_eq!(
            finding.message,
            Message::RecurringHypoglycemiaPattern { hour: 3, count: 2 }
        );
        assert_eq!(finding.suggestion, Message::LowerDoseAroundHour { hour: 3 });
    }

    #[test]
    fn test_recurring_hyperglycemia_needs_high_average() {
        let days = vec![
            day((2024, 3, 1), &[(20, 210.0), (8, 150.0)]),
            day((2024, 3, 2), &[(20, 220.0), (8, 160.0)]),
            day((2024, 3, 3), &[(20, 230.0), (8, 170.0)]),
        ];
        let report = analyze_patterns(&days);
        assert_eq!(report.findings.len(), 1);
        let finding = &report.findings[0];
        assert_eq!(finding.kind, PatternKind::RecurringHyperglycemia);
        assert_eq!(
            finding.message,
            Message::RecurringHyperglycemiaPattern {
                hour: 20,
                average: 220.0
            }
        );
    }

    #[test]
    fn test_mild_highs_below_average_threshold_not_flagged() {
        // Two readings above 180 but bucket average under 200
        let days = vec![
            day((2024, 3, 1), &[(20, 185.0), (8, 120.0)]),
            day((2024, 3, 2), &[(20, 190.0), (8, 125.0)]),
        ];
        let report = analyze_patterns(&days);
        assert_eq!(report.findings[0].kind, PatternKind::NoPatterns);
    }

    #[test]
    fn test_high_variability_flagged_without_clusters() {
        let days = vec![day(
            (2024, 3, 1),
            &[(6, 40.0), (10, 250.0), (14, 60.0), (20, 300.0)],
        )];
        let report = analyze_patterns(&days);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].kind, PatternKind::HighVariability);
        assert!(report.glucose_std_dev > 50.0);
        assert_eq!(report.findings[0].suggestion, Message::StabilizeRoutine);
    }

    #[test]
    fn test_single_sample_buckets_never_flag() {
        let days = vec![day((2024, 3, 1), &[(3, 55.0), (9, 110.0), (15, 120.0)])];
        let report = analyze_patterns(&days);
        assert_eq!(report.findings[0].kind, PatternKind::NoPatterns);
    }

    #[test]
    fn test_stable_week_reports_no_patterns() {
        let days = vec![
            day((2024, 3, 1), &[(8, 100.0), (12, 110.0), (18, 120.0)]),
            day((2024, 3, 2), &[(8, 105.0), (12, 115.0), (18, 125.0)]),
        ];
        let report = analyze_patterns(&days);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].kind, PatternKind::NoPatterns);
        assert_eq!(report.findings[0].message, Message::NoPatternsDetected);
        assert_eq!(report.findings[0].suggestion, Message::KeepCurrentRoutine);
    }
}
