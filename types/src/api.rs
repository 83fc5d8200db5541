//! External views and outcome descriptors returned by the progression engine.

use crate::clicker::PlayerId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity fields supplied by an authenticated login.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub platform_id: u64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Player state as shown to clients, with read-time derived fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub uid: PlayerId,
    pub platform_id: Option<u64>,
    pub username: Option<String>,
    pub display_name: String,
    pub points: u64,
    pub level: u32,
    pub multiplier: u32,
    pub referrals: u64,
    pub referred_by: Option<u64>,
    pub daily_bonus_available: bool,
    pub daily_bonus_claimed_at: Option<u64>,
    /// Only present while the bonus is still locked.
    pub next_daily_bonus_at: Option<u64>,
    pub lottery_joined: bool,
    pub lottery_entered_at: Option<u64>,
    pub night_mode_unlocked: bool,
    pub taps_in_current_second: u32,
    pub level_start_points: u64,
    pub next_level_points: u64,
    pub updated_at: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardItem {
    pub rank: u32,
    pub uid: PlayerId,
    pub platform_id: Option<u64>,
    pub display_name: String,
    pub points: u64,
    pub level: u32,
    pub referrals: u64,
    pub updated_at: u64,
}

/// Expected business-rule refusals. These are outcomes, not faults.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    TapLimitReached { cap: u32 },
    DailyBonusLocked,
    AlreadyReferred,
    SelfReferral,
    AlreadyInLottery,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TapLimitReached { cap } => write!(f, "Tap limit reached. Max {cap} taps/sec."),
            Self::DailyBonusLocked => f.write_str("Daily bonus is not available yet."),
            Self::AlreadyReferred => f.write_str("Referral already applied."),
            Self::SelfReferral => f.write_str("Self-referral is not allowed."),
            Self::AlreadyInLottery => f.write_str("You are already in the lottery."),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapOutcome {
    /// True when any points were added.
    pub ok: bool,
    pub accepted_taps: u32,
    pub rejected_taps: u32,
    pub points_added: u64,
    pub throttled: bool,
    pub rejection: Option<Rejection>,
    pub message: String,
    pub state: PlayerState,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBonusOutcome {
    pub granted: bool,
    pub points_added: u64,
    pub rejection: Option<Rejection>,
    pub message: String,
    pub state: PlayerState,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralOutcome {
    pub applied: bool,
    pub rejection: Option<Rejection>,
    pub message: String,
    pub state: PlayerState,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryOutcome {
    pub entered: bool,
    /// Entry time; on rejection this is the original entry time.
    pub entered_at: Option<u64>,
    pub rejection: Option<Rejection>,
    pub message: String,
    pub state: PlayerState,
}
