use super::super::*;
use super::referral_applied_message;
use crate::projection::raise_levels;
use nightmode_types::{storage::Counter, Rejection};
use tracing::info;

impl<S: State, C: Clock> Engine<S, C> {
    /// Raises both the player and the referrer by the configured number of levels.
    ///
    /// Both players are locked (in id order) for the whole operation and every write, including
    /// the referrer's counter, lands in one atomic commit.
    pub(in crate::engine) async fn handle_apply_referral(
        &self,
        id: &PlayerId,
        referrer_platform_id: u64,
    ) -> Result<ReferralOutcome, Error> {
        let referrer_id = PlayerId::from_platform_id(referrer_platform_id);
        let _guard = self
            .locks
            .lock_all(&[id.clone(), referrer_id.clone()])
            .await;
        let now = self.clock.now_ms();
        let mut staged = Staged::new(&self.state);
        let mut record = self.load_or_create(&mut staged, id, now).await?;

        let rejection = if record.referred_by.is_some() {
            Some(Rejection::AlreadyReferred)
        } else if *id == referrer_id || record.platform_id == Some(referrer_platform_id) {
            Some(Rejection::SelfReferral)
        } else {
            None
        };
        if let Some(rejection) = rejection {
            staged.commit().await?;
            debug!(player = %id, referrer = %referrer_id, ?rejection, "referral rejected");
            return Ok(ReferralOutcome {
                applied: false,
                rejection: Some(rejection),
                message: rejection.to_string(),
                state: player_state(&record, now),
            });
        }

        let levels = self.config.referral_bonus_levels;
        let mut referrer = self.load_or_create(&mut staged, &referrer_id, now).await?;

        raise_levels(&mut record, levels);
        record.referred_by = Some(referrer_platform_id);
        record.updated_at = now;
        stage_player(&mut staged, &record);

        raise_levels(&mut referrer, levels);
        referrer.updated_at = now;
        stage_player(&mut staged, &referrer);
        let referrals = staged
            .increment(&Key::Player(referrer_id.clone()), Counter::Referrals, 1)
            .await?;
        staged
            .increment(&Key::Rating(referrer_id.clone()), Counter::Referrals, 1)
            .await?;

        if let Err(err) = staged.commit().await {
            warn!(player = %id, referrer = %referrer_id, ?err, "referral commit failed");
            return Err(err.into());
        }
        info!(
            player = %id,
            referrer = %referrer_id,
            levels,
            player_level = record.level,
            referrer_level = referrer.level,
            referrals,
            "applied referral"
        );

        Ok(ReferralOutcome {
            applied: true,
            rejection: None,
            message: referral_applied_message(levels),
            state: player_state(&record, now),
        })
    }
}
