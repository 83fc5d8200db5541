//! Common types used throughout nightmode.

pub mod api;
pub mod clicker;
pub mod config;
pub mod storage;

pub use api::{
    DailyBonusOutcome, LeaderboardItem, LotteryOutcome, PlayerProfile, PlayerState,
    ReferralOutcome, Rejection, TapOutcome,
};
pub use clicker::{LotteryEntry, PlayerId, PlayerRecord, RatingRow, TapBatch, ValidationError};
pub use config::ProgressionConfig;
pub use storage::{Counter, Index, Key, Value};
