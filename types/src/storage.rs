//! Storage keys and values shared by every `State` backend.

use crate::clicker::{LotteryEntry, PlayerId, PlayerRecord, RatingRow};

#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Key {
    /// Authoritative player record.
    Player(PlayerId),
    /// Ranking projection of a player record.
    Rating(PlayerId),
    /// Lottery entry snapshot.
    Lottery(PlayerId),
}

impl Key {
    pub fn player_id(&self) -> &PlayerId {
        match self {
            Self::Player(id) | Self::Rating(id) | Self::Lottery(id) => id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Player(PlayerRecord),
    Rating(RatingRow),
    Lottery(LotteryEntry),
}

impl Value {
    /// Whether this value may be stored under `key`.
    pub fn matches(&self, key: &Key) -> bool {
        matches!(
            (key, self),
            (Key::Player(_), Value::Player(_))
                | (Key::Rating(_), Value::Rating(_))
                | (Key::Lottery(_), Value::Lottery(_))
        )
    }

    /// Adds `delta` to `counter` and returns the new value, or `None` when the counter does not
    /// exist on this kind of value.
    pub fn bump(&mut self, counter: Counter, delta: u64) -> Option<u64> {
        let slot = match (counter, self) {
            (Counter::Referrals, Value::Player(record)) => &mut record.referrals,
            (Counter::Referrals, Value::Rating(row)) => &mut row.referrals,
            (Counter::Referrals, Value::Lottery(_)) => return None,
        };
        *slot = slot.saturating_add(delta);
        Some(*slot)
    }
}

/// Counters that backends can increment atomically.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Counter {
    Referrals,
}

/// Ordered views a backend must be able to serve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Index {
    /// Rating rows by points descending, then `updated_at` descending, then id ascending.
    RatingsByPoints,
    /// Lottery entries by `entered_at` descending, then id ascending.
    LotteryByEnteredAt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_matches_key_kind() {
        let id = PlayerId::from_platform_id(1);
        let record = PlayerRecord::new(id.clone(), 0);
        let value = Value::Player(record);
        assert!(value.matches(&Key::Player(id.clone())));
        assert!(!value.matches(&Key::Rating(id.clone())));
        assert!(!value.matches(&Key::Lottery(id)));
    }

    #[test]
    fn test_bump_referrals() {
        let id = PlayerId::from_platform_id(1);
        let mut value = Value::Player(PlayerRecord::new(id.clone(), 0));
        assert_eq!(value.bump(Counter::Referrals, 1), Some(1));
        assert_eq!(value.bump(Counter::Referrals, 2), Some(3));

        let mut entry = Value::Lottery(LotteryEntry {
            uid: id,
            platform_id: Some(1),
            display_name: "tg:1".to_string(),
            points: 0,
            level: 1,
            entered_at: 0,
        });
        assert_eq!(entry.bump(Counter::Referrals, 1), None);
    }
}
