//! Interleaving and failure tests.
//!
//! The faulty backend yields on every read so concurrent operations on the same player would
//! interleave their read-modify-write cycles if the engine did not serialize them.

#[cfg(test)]
mod tests {
    use crate::mocks::faulty_engine;
    use crate::Error;
    use futures::future::join_all;
    use nightmode_types::{PlayerId, ProgressionConfig, Rejection, TapBatch};
    use std::time::Duration;

    fn player(platform_id: u64) -> PlayerId {
        PlayerId::from_platform_id(platform_id)
    }

    #[tokio::test]
    async fn test_concurrent_taps_respect_cap() {
        let (engine, _clock) = faulty_engine(ProgressionConfig::default());
        engine.state().set_yield_on_read(true);
        let id = player(1);
        let batch = TapBatch::new(3).unwrap();

        let outcomes = join_all((0..20).map(|_| engine.record_taps(&id, batch))).await;
        let accepted: u32 = outcomes
            .iter()
            .map(|outcome| outcome.as_ref().unwrap().accepted_taps)
            .sum();
        assert_eq!(accepted, 10);

        let state = engine.get_state(&id).await.unwrap();
        assert_eq!(state.points, 10);
        assert_eq!(state.taps_in_current_second, 10);
    }

    #[tokio::test]
    async fn test_concurrent_bonus_claims_grant_once() {
        let (engine, _clock) = faulty_engine(ProgressionConfig::default());
        engine.state().set_yield_on_read(true);
        let id = player(1);

        let outcomes = join_all((0..8).map(|_| engine.claim_daily_bonus(&id))).await;
        let granted = outcomes
            .iter()
            .filter(|outcome| outcome.as_ref().unwrap().granted)
            .count();
        assert_eq!(granted, 1);
        assert!(outcomes.iter().all(|outcome| {
            let outcome = outcome.as_ref().unwrap();
            outcome.granted || outcome.rejection == Some(Rejection::DailyBonusLocked)
        }));

        let state = engine.get_state(&id).await.unwrap();
        assert_eq!(state.points, 1_000);
    }

    #[tokio::test]
    async fn test_concurrent_referrals_count_every_referee() {
        let (engine, _clock) = faulty_engine(ProgressionConfig::default());
        engine.state().set_yield_on_read(true);
        let referees: Vec<_> = (1..=8).map(player).collect();

        let outcomes = join_all(referees.iter().map(|id| engine.apply_referral(id, 100))).await;
        assert!(outcomes
            .iter()
            .all(|outcome| outcome.as_ref().unwrap().applied));

        let referrer = engine.get_state(&player(100)).await.unwrap();
        assert_eq!(referrer.referrals, 8);
        // Each referral raises the referrer by three levels from wherever it stands.
        assert_eq!(referrer.level, 25);

        let board = engine.top_by_points(Some(1)).await.unwrap();
        assert_eq!(board[0].uid, player(100));
        assert_eq!(board[0].referrals, 8);
    }

    #[tokio::test]
    async fn test_crossed_referrals_do_not_deadlock() {
        let (engine, _clock) = faulty_engine(ProgressionConfig::default());
        engine.state().set_yield_on_read(true);
        let (a, b) = (player(1), player(2));

        let both = futures::future::join(engine.apply_referral(&a, 2), engine.apply_referral(&b, 1));
        let (first, second) = tokio::time::timeout(Duration::from_secs(5), both)
            .await
            .expect("crossed referrals deadlocked");
        assert!(first.unwrap().applied);
        assert!(second.unwrap().applied);

        let a_state = engine.get_state(&a).await.unwrap();
        let b_state = engine.get_state(&b).await.unwrap();
        assert_eq!(a_state.referrals, 1);
        assert_eq!(b_state.referrals, 1);
        assert_eq!(a_state.referred_by, Some(2));
        assert_eq!(b_state.referred_by, Some(1));
    }

    #[tokio::test]
    async fn test_store_failure_is_an_error_not_a_rejection() {
        let (engine, _clock) = faulty_engine(ProgressionConfig::default());
        let id = player(1);
        engine.get_state(&id).await.unwrap();

        engine.state().set_fail_writes(true);
        let result = engine.record_taps(&id, TapBatch::new(5).unwrap()).await;
        assert!(matches!(result, Err(Error::Store(_))));

        engine.state().set_fail_writes(false);
        let state = engine.get_state(&id).await.unwrap();
        assert_eq!(state.points, 0);
        assert_eq!(state.taps_in_current_second, 0);
    }

    #[tokio::test]
    async fn test_failed_referral_leaves_both_players_untouched() {
        let (engine, _clock) = faulty_engine(ProgressionConfig::default());
        let (id, referrer) = (player(1), player(2));
        engine.get_state(&id).await.unwrap();
        engine.get_state(&referrer).await.unwrap();

        engine.state().set_fail_writes(true);
        let result = engine.apply_referral(&id, 2).await;
        assert!(matches!(result, Err(Error::Store(_))));

        engine.state().set_fail_writes(false);
        let player_state = engine.get_state(&id).await.unwrap();
        let referrer_state = engine.get_state(&referrer).await.unwrap();
        assert_eq!(player_state.points, 0);
        assert_eq!(player_state.referred_by, None);
        assert_eq!(referrer_state.points, 0);
        assert_eq!(referrer_state.referrals, 0);

        // Retrying once storage recovers applies the referral normally.
        let retried = engine.apply_referral(&id, 2).await.unwrap();
        assert!(retried.applied);
    }

    #[tokio::test]
    async fn test_stalled_store_times_out() {
        let config = ProgressionConfig {
            request_timeout_ms: Some(20),
            ..ProgressionConfig::default()
        };
        let (engine, _clock) = faulty_engine(config);
        engine.state().set_stall_reads(true);

        let result = engine
            .record_taps(&player(1), TapBatch::new(1).unwrap())
            .await;
        match result {
            Err(err @ Error::Timeout { operation, .. }) => {
                assert_eq!(operation, "record_taps");
                assert!(err.is_timeout());
            }
            other => panic!("expected timeout, got {other:?}"),
        }

        // The lock taken by the abandoned operation was released.
        engine.state().set_stall_reads(false);
        let state = engine.get_state(&player(1)).await.unwrap();
        assert_eq!(state.points, 0);
    }

    #[tokio::test]
    async fn test_independent_players_progress_together() {
        let (engine, _clock) = faulty_engine(ProgressionConfig::default());
        engine.state().set_yield_on_read(true);
        let ids: Vec<_> = (1..=16).map(player).collect();
        let batch = TapBatch::new(10).unwrap();

        let outcomes = join_all(ids.iter().map(|id| engine.record_taps(id, batch))).await;
        assert!(outcomes
            .iter()
            .all(|outcome| outcome.as_ref().unwrap().accepted_taps == 10));

        let board = engine.top_by_points(Some(50)).await.unwrap();
        assert_eq!(board.len(), 16);
        assert!(board.iter().all(|item| item.points == 10));
    }
}
