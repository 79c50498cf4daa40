//! Insulin-on-board decay model.
//!
//! Linear decay over the duration of insulin action (DIA): an injection
//! retains `1 - elapsed/dia` of its units while `0 <= elapsed < dia` and
//! contributes nothing outside that window, including future-dated
//! entries. No rounding happens at this layer; the dose engine rounds its
//! breakdown fields downstream.

use chrono::{DateTime, Utc};

use crate::numeric::decay_fraction;
use crate::types::Injection;

/// Total insulin still active from past injections, in units.
pub fn calculate_iob(injections: &[Injection], now: DateTime<Utc>, dia_hours: f64) -> f64 {
    injections
        .iter()
        .map(|injection| calculate_remaining_iob(injection.units, injection.hours_before(now), dia_hours))
        .sum()
}

/// Insulin remaining from a single injection after `hours_since` hours.
///
/// Returns 0 outside `[0, dia_hours)`.
pub fn calculate_remaining_iob(units: f64, hours_since: f64, dia_hours: f64) -> f64 {
    if hours_since < 0.0 || hours_since >= dia_hours {
        return 0.0;
    }
    units * decay_fraction(hours_since, dia_hours)
}

/// Hours since the most recent injection, selected by maximum timestamp
/// rather than list order. `None` when the history is empty.
pub fn hours_since_last_injection(
    injections: &[Injection],
    now: DateTime<Utc>,
) -> Option<f64> {
    injections
        .iter()
        .max_by_key(|injection| injection.timestamp)
        .map(|injection| injection.hours_before(now))
}

/// Whether enough time has passed since the last injection to dose again.
///
/// True when the history is empty. A future-dated "last" injection yields
/// a negative elapsed time and therefore false.
pub fn is_safe_for_new_dose(
    injections: &[Injection],
    now: DateTime<Utc>,
    minimum_hours: f64,
) -> bool {
    match hours_since_last_injection(injections, now) {
        None => true,
        Some(hours) => hours >= minimum_hours,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn at(now: DateTime<Utc>, hours_ago: f64, units: f64) -> Injection {
        Injection {
            timestamp: now - Duration::milliseconds((hours_ago * 3_600_000.0) as i64),
            units,
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_iob_halfway_through_dia() {
        // 6 U injected 2 h ago with a 4 h DIA -> 3 U remaining
        let now = noon();
        let iob = calculate_iob(&[at(now, 2.0, 6.0)], now, 4.0);
        assert_eq!(iob, 3.0);
    }

    #[test]
    fn test_iob_sums_multiple_injections() {
        let now = noon();
        let injections = vec![at(now, 1.0, 4.0), at(now, 3.0, 4.0)];
        // 4 * 0.75 + 4 * 0.25 = 4.0
        let iob = calculate_iob(&injections, now, 4.0);
        assert!((iob - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_expired_and_future_injections_contribute_zero() {
        let now = noon();
        assert_eq!(calculate_iob(&[at(now, 5.0, 6.0)], now, 4.0), 0.0);
        assert_eq!(calculate_iob(&[at(now, -1.0, 6.0)], now, 4.0), 0.0);
        assert_eq!(calculate_remaining_iob(6.0, 4.0, 4.0), 0.0);
    }

    #[test]
    fn test_safe_for_new_dose_uses_latest_by_timestamp() {
        let now = noon();
        // Out of order on purpose: the 1 h-old injection must win
        let injections = vec![at(now, 6.0, 2.0), at(now, 1.0, 2.0), at(now, 4.0, 2.0)];
        assert!(!is_safe_for_new_dose(&injections, now, 3.0));
        assert!(is_safe_for_new_dose(&[at(now, 3.0, 2.0)], now, 3.0));
        assert!(is_safe_for_new_dose(&[], now, 3.0));
    }

    #[test]
    fn test_future_injection_blocks_new_dose() {
        let now = noon();
        assert!(!is_safe_for_new_dose(&[at(now, -2.0, 2.0)], now, 3.0));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: remaining IOB is non-increasing in elapsed time
        #[test]
        fn prop_iob_monotonic_decay(
            units in 0.5f64..20.0,
            h1 in 0.0f64..5.0,
            delta in 0.0f64..5.0,
            dia in 3.0f64..5.0
        ) {
            let earlier = calculate_remaining_iob(units, h1, dia);
            let later = calculate_remaining_iob(units, h1 + delta, dia);
            prop_assert!(later <= earlier);
        }

        /// Property: IOB never exceeds the injected amount and hits zero at DIA
        #[test]
        fn prop_iob_bounded(
            units in 0.5f64..20.0,
            hours in 0.0f64..10.0,
            dia in 3.0f64..5.0
        ) {
            let remaining = calculate_remaining_iob(units, hours, dia);
            prop_assert!(remaining >= 0.0);
            prop_assert!(remaining <= units);
            if hours >= dia {
                prop_assert_eq!(remaining, 0.0);
            }
        }
    }
}
