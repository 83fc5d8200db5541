//! Ranked views over the rating and lottery projections.

use crate::{state::State, Error};
use anyhow::Context as _;
use nightmode_types::{
    clicker::{MAX_LEADERBOARD_LIMIT, MAX_LOTTERY_LISTING},
    storage::{Index, Value},
    LeaderboardItem, LotteryEntry, RatingRow,
};
use std::cmp::Ordering;

/// Points descending, then most recently updated first. The id breaks remaining ties so
/// listings are stable.
pub fn rank_order(a: &RatingRow, b: &RatingRow) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.updated_at.cmp(&a.updated_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Newest entry first.
pub fn lottery_order(a: &LotteryEntry, b: &LotteryEntry) -> Ordering {
    b.entered_at
        .cmp(&a.entered_at)
        .then_with(|| a.uid.cmp(&b.uid))
}

pub struct Leaderboard<'a, S: State> {
    state: &'a S,
    lottery_limit: usize,
}

impl<'a, S: State> Leaderboard<'a, S> {
    pub fn new(state: &'a S) -> Self {
        Self::with_lottery_limit(state, MAX_LOTTERY_LISTING)
    }

    pub fn with_lottery_limit(state: &'a S, lottery_limit: usize) -> Self {
        Self {
            state,
            lottery_limit: lottery_limit.clamp(1, MAX_LOTTERY_LISTING),
        }
    }

    /// Top players by points with dense 1-based ranks. `limit` is clamped to `1..=50`.
    pub async fn top_by_points(&self, limit: usize) -> Result<Vec<LeaderboardItem>, Error> {
        let limit = limit.clamp(1, MAX_LEADERBOARD_LIMIT);
        let values = self
            .state
            .query_top(Index::RatingsByPoints, limit)
            .await
            .context("query ratings")?;

        let mut rows: Vec<RatingRow> = values
            .into_iter()
            .filter_map(|value| match value {
                Value::Rating(row) => Some(row),
                _ => None,
            })
            .collect();
        rows.sort_by(rank_order);
        rows.truncate(limit);

        Ok(rows
            .into_iter()
            .zip(1u32..)
            .map(|(row, rank)| LeaderboardItem {
                rank,
                uid: row.id,
                platform_id: row.platform_id,
                display_name: row.display_name,
                points: row.points,
                level: row.level,
                referrals: row.referrals,
                updated_at: row.updated_at,
            })
            .collect())
    }

    /// Lottery entries, newest first.
    pub async fn lottery_entries(&self) -> Result<Vec<LotteryEntry>, Error> {
        let values = self
            .state
            .query_top(Index::LotteryByEnteredAt, self.lottery_limit)
            .await
            .context("query lottery entries")?;

        let mut entries: Vec<LotteryEntry> = values
            .into_iter()
            .filter_map(|value| match value {
                Value::Lottery(entry) => Some(entry),
                _ => None,
            })
            .collect();
        entries.sort_by(lottery_order);
        entries.truncate(self.lottery_limit);
        Ok(entries)
    }
}
