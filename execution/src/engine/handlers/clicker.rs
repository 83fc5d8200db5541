use super::super::*;
use super::{DAILY_BONUS_CLAIMED, LOTTERY_ENTERED, TAPS_ACCEPTED, TAPS_PARTIALLY_REJECTED};
use crate::{
    projection::{credit_points, daily_bonus_locked_until, lottery_entry, merge_profile},
    throttle::TapWindow,
};
use nightmode_types::{clicker::SECOND_MS, Rejection};
use tracing::info;

impl<S: State, C: Clock> Engine<S, C> {
    pub(in crate::engine) async fn handle_upsert_player(
        &self,
        profile: PlayerProfile,
    ) -> Result<PlayerState, Error> {
        let id = PlayerId::from_platform_id(profile.platform_id);
        let _guard = self.locks.lock(&id).await;
        let now = self.clock.now_ms();
        let mut staged = Staged::new(&self.state);

        let mut record = self.load_or_create(&mut staged, &id, now).await?;
        if merge_profile(&mut record, &profile) {
            record.updated_at = now;
            stage_player(&mut staged, &record);
            debug!(player = %id, display_name = %record.display_name, "refreshed profile");
        }
        staged.commit().await?;

        Ok(player_state(&record, now))
    }

    pub(in crate::engine) async fn handle_get_state(
        &self,
        id: &PlayerId,
    ) -> Result<PlayerState, Error> {
        let _guard = self.locks.lock(id).await;
        let now = self.clock.now_ms();
        let mut staged = Staged::new(&self.state);

        let record = self.load_or_create(&mut staged, id, now).await?;
        staged.commit().await?;

        Ok(player_state(&record, now))
    }

    pub(in crate::engine) async fn handle_record_taps(
        &self,
        id: &PlayerId,
        taps: TapBatch,
    ) -> Result<TapOutcome, Error> {
        let _guard = self.locks.lock(id).await;
        let now = self.clock.now_ms();
        let mut staged = Staged::new(&self.state);
        let mut record = self.load_or_create(&mut staged, id, now).await?;

        let mut window = TapWindow {
            second: record.last_tap_second,
            used: record.taps_in_second,
        };
        let admission = self.throttler.admit(&mut window, taps.get(), now / SECOND_MS);
        let points_added = u64::from(admission.accepted) * u64::from(record.multiplier.max(1));

        if points_added > 0 {
            credit_points(&mut record, points_added);
            record.night_mode_unlocked = true;
        }
        record.last_tap_second = window.second;
        record.taps_in_second = window.used;
        record.updated_at = now;
        stage_player(&mut staged, &record);
        staged.commit().await?;

        let rejection = admission.throttled().then_some(Rejection::TapLimitReached {
            cap: self.throttler.cap(),
        });
        let message = match rejection {
            Some(rejection) => rejection.to_string(),
            None if admission.rejected > 0 => TAPS_PARTIALLY_REJECTED.to_string(),
            None => TAPS_ACCEPTED.to_string(),
        };
        debug!(
            player = %id,
            accepted = admission.accepted,
            rejected = admission.rejected,
            points_added,
            points = record.points,
            "recorded taps"
        );

        Ok(TapOutcome {
            ok: points_added > 0,
            accepted_taps: admission.accepted,
            rejected_taps: admission.rejected,
            points_added,
            throttled: admission.throttled(),
            rejection,
            message,
            state: player_state(&record, now),
        })
    }

    pub(in crate::engine) async fn handle_claim_daily_bonus(
        &self,
        id: &PlayerId,
    ) -> Result<DailyBonusOutcome, Error> {
        let _guard = self.locks.lock(id).await;
        let now = self.clock.now_ms();
        let mut staged = Staged::new(&self.state);
        let mut record = self.load_or_create(&mut staged, id, now).await?;

        if let Some(unlocks_at) = daily_bonus_locked_until(&record, now) {
            staged.commit().await?;
            debug!(player = %id, unlocks_at, "daily bonus still locked");
            let rejection = Rejection::DailyBonusLocked;
            return Ok(DailyBonusOutcome {
                granted: false,
                points_added: 0,
                rejection: Some(rejection),
                message: rejection.to_string(),
                state: player_state(&record, now),
            });
        }

        let points_added =
            u64::from(record.level.max(1)).saturating_mul(self.config.daily_bonus_per_level);
        credit_points(&mut record, points_added);
        record.daily_bonus_claimed_at = Some(now);
        record.updated_at = now;
        stage_player(&mut staged, &record);
        staged.commit().await?;
        info!(player = %id, points_added, level = record.level, "claimed daily bonus");

        Ok(DailyBonusOutcome {
            granted: true,
            points_added,
            rejection: None,
            message: DAILY_BONUS_CLAIMED.to_string(),
            state: player_state(&record, now),
        })
    }

    pub(in crate::engine) async fn handle_enter_lottery(
        &self,
        id: &PlayerId,
    ) -> Result<LotteryOutcome, Error> {
        let _guard = self.locks.lock(id).await;
        let now = self.clock.now_ms();
        let mut staged = Staged::new(&self.state);
        let mut record = self.load_or_create(&mut staged, id, now).await?;

        if record.lottery_joined {
            staged.commit().await?;
            let rejection = Rejection::AlreadyInLottery;
            return Ok(LotteryOutcome {
                entered: false,
                entered_at: record.lottery_entered_at,
                rejection: Some(rejection),
                message: rejection.to_string(),
                state: player_state(&record, now),
            });
        }

        record.lottery_joined = true;
        record.lottery_entered_at = Some(now);
        record.updated_at = now;
        stage_player(&mut staged, &record);
        staged.insert(
            Key::Lottery(id.clone()),
            Value::Lottery(lottery_entry(&record, now)),
        );
        staged.commit().await?;
        info!(player = %id, points = record.points, level = record.level, "entered lottery");

        Ok(LotteryOutcome {
            entered: true,
            entered_at: Some(now),
            rejection: None,
            message: LOTTERY_ENTERED.to_string(),
            state: player_state(&record, now),
        })
    }
}
