//! Derivations from the authoritative player record: load-time normalization, the rating and
//! lottery projections, and the client-facing state view.

use crate::curve::{level_from_points, next_level_threshold, points_for_level};
use nightmode_types::{
    clicker::{clamp_name, DAILY_BONUS_COOLDOWN_MS, SECOND_MS},
    LotteryEntry, PlayerId, PlayerProfile, PlayerRecord, PlayerState, RatingRow,
};

/// Re-derives every computed field of a stored record.
///
/// `level` and `multiplier` always follow `points`, and the key a record was stored under wins
/// over any id embedded in it.
pub fn normalize(mut record: PlayerRecord, id: &PlayerId) -> PlayerRecord {
    if record.id != *id {
        record.id = id.clone();
    }
    if record.platform_id.is_none() {
        record.platform_id = id.platform_id();
    }
    recompute_level(&mut record);
    record.refresh_display_name();
    record
}

pub fn recompute_level(record: &mut PlayerRecord) {
    record.level = level_from_points(record.points);
    record.multiplier = record.level;
}

/// Adds points and keeps the level in step. Points never decrease.
pub fn credit_points(record: &mut PlayerRecord, points: u64) {
    record.points = record.points.saturating_add(points);
    recompute_level(record);
}

/// Raises points to at least the start of `level + levels`. Never lowers them.
pub fn raise_levels(record: &mut PlayerRecord, levels: u32) {
    let target = points_for_level(record.level.saturating_add(levels));
    record.points = record.points.max(target);
    recompute_level(record);
}

/// Merges login identity into `record`. Returns whether anything changed.
pub fn merge_profile(record: &mut PlayerRecord, profile: &PlayerProfile) -> bool {
    let mut changed = false;
    if record.platform_id != Some(profile.platform_id) {
        record.platform_id = Some(profile.platform_id);
        changed = true;
    }
    if let Some(username) = profile.username.as_deref().map(clamp_name) {
        if !username.is_empty() && record.username.as_deref() != Some(username.as_str()) {
            record.username = Some(username);
            changed = true;
        }
    }
    if let Some(first_name) = profile.first_name.as_deref().map(clamp_name) {
        if first_name != record.first_name {
            record.first_name = first_name;
            changed = true;
        }
    }
    if let Some(last_name) = profile.last_name.as_deref().map(clamp_name) {
        if last_name != record.last_name {
            record.last_name = last_name;
            changed = true;
        }
    }
    if changed {
        record.refresh_display_name();
    }
    changed
}

/// When the daily bonus unlocks again, or `None` if it can be claimed at `now`.
pub fn daily_bonus_locked_until(record: &PlayerRecord, now: u64) -> Option<u64> {
    let next = record
        .daily_bonus_claimed_at?
        .saturating_add(DAILY_BONUS_COOLDOWN_MS);
    (now < next).then_some(next)
}

pub fn rating_row(record: &PlayerRecord) -> RatingRow {
    RatingRow {
        id: record.id.clone(),
        platform_id: record.platform_id,
        display_name: record.display_name.clone(),
        points: record.points,
        level: record.level,
        referrals: record.referrals,
        updated_at: record.updated_at,
    }
}

pub fn lottery_entry(record: &PlayerRecord, entered_at: u64) -> LotteryEntry {
    LotteryEntry {
        uid: record.id.clone(),
        platform_id: record.platform_id,
        display_name: record.display_name.clone(),
        points: record.points,
        level: record.level,
        entered_at,
    }
}

pub fn player_state(record: &PlayerRecord, now: u64) -> PlayerState {
    let next_daily_bonus_at = daily_bonus_locked_until(record, now);
    let taps_in_current_second = if record.last_tap_second == now / SECOND_MS {
        record.taps_in_second
    } else {
        0
    };
    PlayerState {
        uid: record.id.clone(),
        platform_id: record.platform_id,
        username: record.username.clone(),
        display_name: record.display_name.clone(),
        points: record.points,
        level: record.level,
        multiplier: record.multiplier,
        referrals: record.referrals,
        referred_by: record.referred_by,
        daily_bonus_available: next_daily_bonus_at.is_none(),
        daily_bonus_claimed_at: record.daily_bonus_claimed_at,
        next_daily_bonus_at,
        lottery_joined: record.lottery_joined,
        lottery_entered_at: record.lottery_entered_at,
        night_mode_unlocked: record.night_mode_unlocked,
        taps_in_current_second,
        level_start_points: points_for_level(record.level),
        next_level_points: next_level_threshold(record.level),
        updated_at: record.updated_at,
    }
}
