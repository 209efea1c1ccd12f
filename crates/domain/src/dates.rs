//! Half-open date-range arithmetic.
//!
//! Check-in/check-out ranges are `[start, end)`: the night of `end - 1` is
//! the last occupied night, and `end` itself is the turnover day. Every
//! overlap and expansion in the engine goes through these helpers so the
//! semantics stay in one place.

use chrono::{Days, NaiveDate};

/// True when the half-open ranges `[a_start, a_end)` and `[b_start, b_end)`
/// intersect. Touching endpoints (back-to-back bookings) do not overlap.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Iterate the nights of `[start, end)`: every occupied calendar date, the
/// checkout day excluded. Empty when `end <= start`.
pub fn nights(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(start), |d| d.checked_add_days(Days::new(1)))
        .take_while(move |d| *d < end)
}

/// Iterate every date of the inclusive range `[start, end]`, as used by the
/// bulk settings applier's range mode.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(start), |d| d.checked_add_days(Days::new(1)))
        .take_while(move |d| *d <= end)
}

/// Number of nights in `[start, end)`; zero when the range is empty or
/// inverted.
pub fn night_count(start: NaiveDate, end: NaiveDate) -> u64 {
    end.signed_duration_since(start).num_days().max(0) as u64
}

/// Collapse a sorted list of dates into half-open ranges of consecutive
/// nights. `[1, 2, 3, 7]` becomes `[1, 4)` and `[7, 8)`.
pub fn coalesce_nights(dates: &[NaiveDate]) -> Vec<(NaiveDate, NaiveDate)> {
    let mut ranges = Vec::new();
    let mut iter = dates.iter().copied();

    let Some(first) = iter.next() else {
        return ranges;
    };

    let mut start = first;
    let mut prev = first;

    for date in iter {
        if date != next_day(prev) {
            ranges.push((start, next_day(prev)));
            start = date;
        }
        prev = date;
    }
    ranges.push((start, next_day(prev)));

    ranges
}

fn next_day(date: NaiveDate) -> NaiveDate {
    // NaiveDate::MAX is ~year 262143; calendar dates never get near it.
    date.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn overlap_is_strict_half_open() {
        // [10, 15) vs [14, 18) overlaps on the 14th
        assert!(ranges_overlap(d(2024, 6, 10), d(2024, 6, 15), d(2024, 6, 14), d(2024, 6, 18)));
        // [10, 15) vs [15, 20) is back-to-back turnover, legal
        assert!(!ranges_overlap(d(2024, 6, 10), d(2024, 6, 15), d(2024, 6, 15), d(2024, 6, 20)));
        // fully contained
        assert!(ranges_overlap(d(2024, 6, 1), d(2024, 6, 30), d(2024, 6, 10), d(2024, 6, 11)));
        // disjoint
        assert!(!ranges_overlap(d(2024, 6, 1), d(2024, 6, 5), d(2024, 6, 6), d(2024, 6, 9)));
    }

    #[test]
    fn nights_exclude_checkout() {
        let got: Vec<_> = nights(d(2024, 5, 1), d(2024, 5, 4)).collect();
        assert_eq!(got, vec![d(2024, 5, 1), d(2024, 5, 2), d(2024, 5, 3)]);
    }

    #[test]
    fn empty_and_inverted_ranges_have_no_nights() {
        assert_eq!(nights(d(2024, 5, 1), d(2024, 5, 1)).count(), 0);
        assert_eq!(nights(d(2024, 5, 4), d(2024, 5, 1)).count(), 0);
        assert_eq!(night_count(d(2024, 5, 4), d(2024, 5, 1)), 0);
    }

    #[test]
    fn inclusive_days_include_both_ends() {
        let got: Vec<_> = days_inclusive(d(2024, 5, 1), d(2024, 5, 3)).collect();
        assert_eq!(got, vec![d(2024, 5, 1), d(2024, 5, 2), d(2024, 5, 3)]);
        assert_eq!(days_inclusive(d(2024, 5, 1), d(2024, 5, 1)).count(), 1);
    }

    #[test]
    fn coalesce_groups_consecutive_runs() {
        let dates =
            vec![d(2024, 5, 1), d(2024, 5, 2), d(2024, 5, 3), d(2024, 5, 7), d(2024, 5, 8)];
        let ranges = coalesce_nights(&dates);
        assert_eq!(
            ranges,
            vec![(d(2024, 5, 1), d(2024, 5, 4)), (d(2024, 5, 7), d(2024, 5, 9))]
        );
    }

    #[test]
    fn coalesce_empty_input() {
        assert!(coalesce_nights(&[]).is_empty());
    }
}
