//! Tunables consumed by the progression engine.

use crate::clicker::{
    DEFAULT_DAILY_BONUS_PER_LEVEL, DEFAULT_MAX_TAPS_PER_SECOND, DEFAULT_REFERRAL_BONUS_LEVELS,
    MAX_LEADERBOARD_LIMIT, MAX_LOTTERY_LISTING,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    #[serde(default = "default_max_taps_per_second")]
    pub max_taps_per_second: u32,
    #[serde(default = "default_daily_bonus_per_level")]
    pub daily_bonus_per_level: u64,
    #[serde(default = "default_referral_bonus_levels")]
    pub referral_bonus_levels: u32,
    #[serde(default = "default_leaderboard_limit")]
    pub leaderboard_limit: usize,
    #[serde(default = "default_lottery_listing_limit")]
    pub lottery_listing_limit: usize,
    /// Upper bound on a single engine operation, including storage I/O. Unbounded when unset.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

fn default_max_taps_per_second() -> u32 {
    DEFAULT_MAX_TAPS_PER_SECOND
}

fn default_daily_bonus_per_level() -> u64 {
    DEFAULT_DAILY_BONUS_PER_LEVEL
}

fn default_referral_bonus_levels() -> u32 {
    DEFAULT_REFERRAL_BONUS_LEVELS
}

fn default_leaderboard_limit() -> usize {
    MAX_LEADERBOARD_LIMIT
}

fn default_lottery_listing_limit() -> usize {
    MAX_LOTTERY_LISTING
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            max_taps_per_second: DEFAULT_MAX_TAPS_PER_SECOND,
            daily_bonus_per_level: DEFAULT_DAILY_BONUS_PER_LEVEL,
            referral_bonus_levels: DEFAULT_REFERRAL_BONUS_LEVELS,
            leaderboard_limit: MAX_LEADERBOARD_LIMIT,
            lottery_listing_limit: MAX_LOTTERY_LISTING,
            request_timeout_ms: None,
        }
    }
}

impl ProgressionConfig {
    /// Clamps every tunable into its usable range.
    pub fn normalized(self) -> Self {
        Self {
            max_taps_per_second: self.max_taps_per_second.max(1),
            daily_bonus_per_level: self.daily_bonus_per_level.max(1),
            referral_bonus_levels: self.referral_bonus_levels.max(1),
            leaderboard_limit: self.leaderboard_limit.clamp(1, MAX_LEADERBOARD_LIMIT),
            lottery_listing_limit: self.lottery_listing_limit.clamp(1, MAX_LOTTERY_LISTING),
            request_timeout_ms: self.request_timeout_ms.filter(|ms| *ms > 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: ProgressionConfig =
            serde_json::from_str(r#"{"daily_bonus_per_level": 250}"#).unwrap();
        assert_eq!(config.daily_bonus_per_level, 250);
        assert_eq!(config.max_taps_per_second, DEFAULT_MAX_TAPS_PER_SECOND);
        assert_eq!(config.referral_bonus_levels, DEFAULT_REFERRAL_BONUS_LEVELS);
        assert_eq!(config.request_timeout_ms, None);
    }

    #[test]
    fn test_normalized_clamps_ranges() {
        let config = ProgressionConfig {
            max_taps_per_second: 0,
            daily_bonus_per_level: 0,
            referral_bonus_levels: 0,
            leaderboard_limit: 500,
            lottery_listing_limit: 0,
            request_timeout_ms: Some(0),
        }
        .normalized();
        assert_eq!(config.max_taps_per_second, 1);
        assert_eq!(config.daily_bonus_per_level, 1);
        assert_eq!(config.referral_bonus_levels, 1);
        assert_eq!(config.leaderboard_limit, MAX_LEADERBOARD_LIMIT);
        assert_eq!(config.lottery_listing_limit, 1);
        assert_eq!(config.request_timeout_ms, None);
    }
}
