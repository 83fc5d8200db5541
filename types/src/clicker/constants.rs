/// Prefix of player ids derived from a chat-platform user id.
pub const PLAYER_ID_PREFIX: &str = "tg:";

/// Maximum player id length in bytes.
pub const MAX_PLAYER_ID_LENGTH: usize = 64;

/// Maximum length of a handle, first name, last name or display name.
pub const MAX_NAME_LENGTH: usize = 64;

/// Full name (`first last`) upper bound.
pub const MAX_DISPLAY_NAME_LENGTH: usize = MAX_NAME_LENGTH * 2 + 1;

/// Tap batch bounds accepted from clients.
pub const MIN_TAPS_PER_BATCH: u32 = 1;
pub const MAX_TAPS_PER_BATCH: u32 = 50;

/// Levels 1..=30 cost `LOW_TIER_STEP` points each.
pub const LOW_TIER_MAX_LEVEL: u32 = 30;
pub const LOW_TIER_STEP: u64 = 10_000;

/// Points needed to reach `LOW_TIER_MAX_LEVEL`.
pub const HIGH_TIER_BASE: u64 = 290_000;
/// Every level past `LOW_TIER_MAX_LEVEL` costs `HIGH_TIER_STEP` points.
pub const HIGH_TIER_STEP: u64 = 100_000;

pub const SECOND_MS: u64 = 1_000;

/// Daily bonus cooldown (24h).
pub const DAILY_BONUS_COOLDOWN_MS: u64 = 24 * 60 * 60 * SECOND_MS;

pub const DEFAULT_MAX_TAPS_PER_SECOND: u32 = 10;
pub const DEFAULT_DAILY_BONUS_PER_LEVEL: u64 = 1_000;
pub const DEFAULT_REFERRAL_BONUS_LEVELS: u32 = 3;

/// Leaderboard size cap.
pub const MAX_LEADERBOARD_LIMIT: usize = 50;

/// Lottery listing cap.
pub const MAX_LOTTERY_LISTING: usize = 1_000;
