use crate::{
    clock::{Clock, SystemClock},
    leaderboard::Leaderboard,
    locks::KeyedLocks,
    projection::{normalize, player_state, rating_row},
    state::{Staged, State},
    throttle::TapThrottler,
    Error,
};
use anyhow::{anyhow, Context as _};
use nightmode_types::{
    storage::{Key, Value},
    DailyBonusOutcome, LeaderboardItem, LotteryEntry, LotteryOutcome, PlayerId, PlayerProfile,
    PlayerRecord, PlayerState, ProgressionConfig, ReferralOutcome, TapBatch, TapOutcome,
};
use std::{future::Future, time::Duration};
use tracing::{debug, warn};

mod handlers;

/// Progression engine.
///
/// Every mutating operation holds the lock of each player it touches for its whole
/// read-modify-write cycle and commits through a single atomic `State::apply`.
pub struct Engine<S: State, C: Clock = SystemClock> {
    state: S,
    clock: C,
    config: ProgressionConfig,
    throttler: TapThrottler,
    locks: KeyedLocks<PlayerId>,
}

impl<S: State> Engine<S> {
    pub fn new(state: S, config: ProgressionConfig) -> Self {
        Self::with_clock(state, SystemClock, config)
    }
}

impl<S: State, C: Clock> Engine<S, C> {
    pub fn with_clock(state: S, clock: C, config: ProgressionConfig) -> Self {
        let config = config.normalized();
        Self {
            throttler: TapThrottler::new(config.max_taps_per_second),
            state,
            clock,
            config,
            locks: KeyedLocks::new(),
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    pub fn leaderboard(&self) -> Leaderboard<'_, S> {
        Leaderboard::with_lottery_limit(&self.state, self.config.lottery_listing_limit)
    }

    /// Creates or refreshes a player from login identity.
    pub async fn upsert_player(&self, profile: PlayerProfile) -> Result<PlayerState, Error> {
        self.bounded("upsert_player", self.handle_upsert_player(profile))
            .await
    }

    /// Current state of a player, creating a fresh record on first sight.
    pub async fn get_state(&self, id: &PlayerId) -> Result<PlayerState, Error> {
        self.bounded("get_state", self.handle_get_state(id)).await
    }

    pub async fn record_taps(&self, id: &PlayerId, taps: TapBatch) -> Result<TapOutcome, Error> {
        self.bounded("record_taps", self.handle_record_taps(id, taps))
            .await
    }

    pub async fn claim_daily_bonus(&self, id: &PlayerId) -> Result<DailyBonusOutcome, Error> {
        self.bounded("claim_daily_bonus", self.handle_claim_daily_bonus(id))
            .await
    }

    pub async fn apply_referral(
        &self,
        id: &PlayerId,
        referrer_platform_id: u64,
    ) -> Result<ReferralOutcome, Error> {
        self.bounded(
            "apply_referral",
            self.handle_apply_referral(id, referrer_platform_id),
        )
        .await
    }

    pub async fn enter_lottery(&self, id: &PlayerId) -> Result<LotteryOutcome, Error> {
        self.bounded("enter_lottery", self.handle_enter_lottery(id))
            .await
    }

    /// Leaderboard page; `limit` defaults to the configured size and is clamped to `1..=50`.
    pub async fn top_by_points(&self, limit: Option<usize>) -> Result<Vec<LeaderboardItem>, Error> {
        let limit = limit.unwrap_or(self.config.leaderboard_limit);
        self.bounded("top_by_points", self.leaderboard().top_by_points(limit))
            .await
    }

    pub async fn lottery_entries(&self) -> Result<Vec<LotteryEntry>, Error> {
        self.bounded("lottery_entries", self.leaderboard().lottery_entries())
            .await
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        work: impl Future<Output = Result<T, Error>>,
    ) -> Result<T, Error> {
        let Some(timeout_ms) = self.config.request_timeout_ms else {
            return work.await;
        };
        match tokio::time::timeout(Duration::from_millis(timeout_ms), work).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, timeout_ms, "operation timed out");
                Err(Error::Timeout {
                    operation,
                    timeout_ms,
                })
            }
        }
    }

    /// Loads and normalizes a player, staging a fresh record when none exists.
    async fn load_or_create(
        &self,
        staged: &mut Staged<'_, S>,
        id: &PlayerId,
        now: u64,
    ) -> Result<PlayerRecord, Error> {
        let loaded = staged
            .get(&Key::Player(id.clone()))
            .await
            .with_context(|| format!("load player {id}"))?;
        match loaded {
            Some(Value::Player(record)) => Ok(normalize(record, id)),
            Some(_) => Err(anyhow!("player key {id} holds a non-player value").into()),
            None => {
                let record = PlayerRecord::new(id.clone(), now);
                stage_player(staged, &record);
                debug!(player = %id, "created player");
                Ok(record)
            }
        }
    }
}

/// Stages a player record together with its rating projection.
fn stage_player<S: State>(staged: &mut Staged<'_, S>, record: &PlayerRecord) {
    staged.insert(
        Key::Rating(record.id.clone()),
        Value::Rating(rating_row(record)),
    );
    staged.insert(Key::Player(record.id.clone()), Value::Player(record.clone()));
}
