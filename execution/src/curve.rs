//! Two-tier level curve.
//!
//! Levels 1..=30 cost 10,000 points each; every level after that costs 100,000 points. The
//! two functions below are exact inverses at every level boundary.

use nightmode_types::clicker::{HIGH_TIER_BASE, HIGH_TIER_STEP, LOW_TIER_MAX_LEVEL, LOW_TIER_STEP};

/// Cumulative points at which `level` starts. Levels below 1 are treated as 1.
pub fn points_for_level(level: u32) -> u64 {
    let level = level.max(1);
    if level <= LOW_TIER_MAX_LEVEL {
        return u64::from(level - 1) * LOW_TIER_STEP;
    }
    HIGH_TIER_BASE + u64::from(level - LOW_TIER_MAX_LEVEL) * HIGH_TIER_STEP
}

/// Level reached with `points` cumulative points.
pub fn level_from_points(points: u64) -> u32 {
    if points < HIGH_TIER_BASE {
        return (points / LOW_TIER_STEP) as u32 + 1;
    }
    let above = (points - HIGH_TIER_BASE) / HIGH_TIER_STEP;
    u64::from(LOW_TIER_MAX_LEVEL)
        .saturating_add(above)
        .min(u64::from(u32::MAX)) as u32
}

/// Points needed for the level after `level`, for progress display. There is no terminal level.
pub fn next_level_threshold(level: u32) -> u64 {
    points_for_level(level.max(1).saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_low_tier_thresholds() {
        assert_eq!(points_for_level(0), 0);
        assert_eq!(points_for_level(1), 0);
        assert_eq!(points_for_level(2), 10_000);
        assert_eq!(points_for_level(4), 30_000);
        assert_eq!(points_for_level(30), 290_000);
    }

    #[test]
    fn test_high_tier_thresholds() {
        assert_eq!(points_for_level(31), 390_000);
        assert_eq!(points_for_level(40), 1_290_000);
    }

    #[test]
    fn test_level_from_points_boundaries() {
        assert_eq!(level_from_points(0), 1);
        assert_eq!(level_from_points(9_999), 1);
        assert_eq!(level_from_points(10_000), 2);
        assert_eq!(level_from_points(289_999), 29);
        assert_eq!(level_from_points(290_000), 30);
        assert_eq!(level_from_points(389_999), 30);
        assert_eq!(level_from_points(390_000), 31);
    }

    #[test]
    fn test_level_from_points_saturates() {
        assert_eq!(level_from_points(u64::MAX), u32::MAX);
    }

    #[test]
    fn test_next_level_threshold() {
        assert_eq!(next_level_threshold(1), 10_000);
        assert_eq!(next_level_threshold(29), 290_000);
        assert_eq!(next_level_threshold(30), 390_000);
        assert_eq!(next_level_threshold(0), 10_000);
    }

    proptest! {
        #[test]
        fn prop_inverse_at_boundaries(level in 1u32..=u32::MAX) {
            prop_assert_eq!(level_from_points(points_for_level(level)), level);
        }

        #[test]
        fn prop_points_for_level_monotone(a in 0u32..1_000_000, b in 0u32..1_000_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(points_for_level(lo) <= points_for_level(hi));
        }

        #[test]
        fn prop_level_from_points_monotone(a in any::<u64>(), b in any::<u64>()) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(level_from_points(lo) <= level_from_points(hi));
        }

        #[test]
        fn prop_points_fall_inside_their_level(points in 0u64..10_000_000_000) {
            let level = level_from_points(points);
            prop_assert!(points_for_level(level) <= points);
            prop_assert!(points < next_level_threshold(level));
        }
    }
}
