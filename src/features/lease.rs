//! Remaining-lease feature.

use crate::domain::LEASE_TERM_YEARS;

/// Years left on a 99-year lease as of the configured baseline year.
///
/// The baseline is a fixed policy constant, not the wall-clock year: the model
/// was trained against a specific baseline and the feature must not drift.
pub fn lease_remaining_years(lease_commence_date: i32, baseline_year: i32) -> i32 {
    LEASE_TERM_YEARS - (baseline_year - lease_commence_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DEFAULT_LEASE_BASELINE_YEAR;

    #[test]
    fn remaining_years_against_default_baseline() {
        assert_eq!(lease_remaining_years(1990, DEFAULT_LEASE_BASELINE_YEAR), 66);
        assert_eq!(lease_remaining_years(2023, DEFAULT_LEASE_BASELINE_YEAR), 99);
        assert_eq!(lease_remaining_years(1960, DEFAULT_LEASE_BASELINE_YEAR), 36);
    }

    #[test]
    fn monotonic_in_commence_year() {
        let mut prev = lease_remaining_years(1960, DEFAULT_LEASE_BASELINE_YEAR);
        for year in 1961..=2023 {
            let cur = lease_remaining_years(year, DEFAULT_LEASE_BASELINE_YEAR);
            assert_eq!(cur, 99 - (2023 - year));
            assert!(cur > prev);
            prev = cur;
        }
    }

    #[test]
    fn baseline_is_configurable() {
        assert_eq!(lease_remaining_years(1990, 2025), 64);
    }
}
