//! Difficulty-target retargeting: adjusts a target by the ratio of a
//! retarget window's observed block-time span to its expected span.
//!
//! `calMedianBlockTime`'s tie-breaking rule for duplicate timestamps is
//! left unspecified upstream. This only ever needs the scalar median
//! value, not which block produced it, so duplicates sort adjacently and
//! the middle element of the sorted window is the answer regardless of
//! how many timestamps tie for it.

use crate::error::ArithmeticError;
use crate::U256;

/// Number of blocks a retarget window spans.
pub const RETARGET_WINDOW_SIZE: usize = 18;

/// Median of `timestamps` (milliseconds since epoch). `None` for an empty
/// window. For an even-length window, the lower of the two middle
/// elements.
pub fn cal_median_block_time(timestamps: &[u64]) -> Option<u64> {
    if timestamps.is_empty() {
        return None;
    }
    let mut sorted = timestamps.to_vec();
    sorted.sort_unstable();
    Some(sorted[(sorted.len() - 1) / 2])
}

/// Adjusts `current` by the ratio of `observed_span_millis` to
/// `expected_span_millis`: `current * observed / expected`.
pub fn re_target(
    current: &U256,
    expected_span_millis: u64,
    observed_span_millis: u64,
) -> Result<U256, ArithmeticError> {
    if expected_span_millis == 0 {
        return Err(ArithmeticError::DivisionByZero);
    }
    current
        .checked_mul(&U256::from_u64(observed_span_millis))?
        .checked_div(&U256::from_u64(expected_span_millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_expected_span_leaves_target_unchanged() {
        let current = U256::from_u64(1_000_000);
        assert_eq!(re_target(&current, 1000, 1000).unwrap(), current);
    }

    #[test]
    fn double_expected_span_doubles_the_target() {
        let current = U256::from_u64(1_000_000);
        assert_eq!(re_target(&current, 1000, 2000).unwrap(), U256::from_u64(2_000_000));
    }

    #[test]
    fn half_expected_span_halves_the_target() {
        let current = U256::from_u64(1_000_000);
        assert_eq!(re_target(&current, 1000, 500).unwrap(), U256::from_u64(500_000));
    }

    #[test]
    fn zero_expected_span_is_rejected() {
        let current = U256::from_u64(1_000_000);
        assert_eq!(re_target(&current, 0, 1000), Err(ArithmeticError::DivisionByZero));
    }

    #[test]
    fn median_of_odd_length_window_is_the_middle_element() {
        assert_eq!(cal_median_block_time(&[5, 1, 3]), Some(3));
    }

    #[test]
    fn median_of_even_length_window_is_the_lower_middle_element() {
        assert_eq!(cal_median_block_time(&[1, 2, 3, 4]), Some(2));
    }

    #[test]
    fn duplicate_timestamps_still_produce_a_deterministic_median() {
        assert_eq!(cal_median_block_time(&[7, 7, 7, 1]), Some(7));
    }

    #[test]
    fn empty_window_has_no_median() {
        assert_eq!(cal_median_block_time(&[]), None);
    }
}
