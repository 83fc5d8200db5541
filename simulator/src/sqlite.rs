//! Durable `State` backend on SQLite.
//!
//! Each key kind has its own table. Rows are stored as codec-encoded blobs next to the columns
//! the ranked indexes sort on, so `query_top` is a plain ordered `SELECT`.

use anyhow::{anyhow, bail, Context, Result};
use commonware_codec::{DecodeExt, Encode};
use nightmode_execution::State;
use nightmode_types::{
    storage::{Counter, Index, Key, Value},
    LotteryEntry, PlayerRecord, RatingRow,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::{
    path::Path,
    sync::{Arc, Mutex},
};

#[derive(Clone)]
pub struct SqliteState {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteState {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("open nightmode db")?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory nightmode db")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn run<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|_| anyhow!("sqlite connection lock poisoned"))?;
            work(&mut conn)
        })
        .await
        .context("sqlite task failed")?
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA synchronous=NORMAL;
         CREATE TABLE IF NOT EXISTS players (
             id TEXT PRIMARY KEY,
             record BLOB NOT NULL
         );
         CREATE TABLE IF NOT EXISTS ratings (
             id TEXT PRIMARY KEY,
             points INTEGER NOT NULL,
             updated_at INTEGER NOT NULL,
             row BLOB NOT NULL
         );
         CREATE INDEX IF NOT EXISTS ratings_by_points
             ON ratings (points DESC, updated_at DESC, id ASC);
         CREATE TABLE IF NOT EXISTS lottery (
             id TEXT PRIMARY KEY,
             entered_at INTEGER NOT NULL,
             entry BLOB NOT NULL
         );
         CREATE INDEX IF NOT EXISTS lottery_by_entered_at
             ON lottery (entered_at DESC, id ASC);",
    )
    .context("init nightmode schema")?;
    Ok(())
}

/// SQLite integers are signed; sort columns saturate instead of failing on huge values.
fn sort_column(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn read_value(conn: &Connection, key: &Key) -> Result<Option<Value>> {
    let (sql, id) = match key {
        Key::Player(id) => ("SELECT record FROM players WHERE id = ?1", id),
        Key::Rating(id) => ("SELECT row FROM ratings WHERE id = ?1", id),
        Key::Lottery(id) => ("SELECT entry FROM lottery WHERE id = ?1", id),
    };
    let bytes: Option<Vec<u8>> = conn
        .query_row(sql, params![id.as_str()], |row| row.get(0))
        .optional()
        .with_context(|| format!("read {key:?}"))?;
    let Some(bytes) = bytes else {
        return Ok(None);
    };
    decode_value(key, &bytes).map(Some)
}

fn decode_value(key: &Key, bytes: &[u8]) -> Result<Value> {
    let value = match key {
        Key::Player(_) => Value::Player(
            PlayerRecord::decode(&mut &bytes[..]).context("decode player record")?,
        ),
        Key::Rating(_) => {
            Value::Rating(RatingRow::decode(&mut &bytes[..]).context("decode rating row")?)
        }
        Key::Lottery(_) => Value::Lottery(
            LotteryEntry::decode(&mut &bytes[..]).context("decode lottery entry")?,
        ),
    };
    Ok(value)
}

fn write_value(conn: &Connection, key: &Key, value: &Value) -> Result<()> {
    if !value.matches(key) {
        bail!("value kind does not match key {key:?}");
    }
    let id = key.player_id().as_str();
    match value {
        Value::Player(record) => conn.execute(
            "INSERT INTO players (id, record) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET record = excluded.record",
            params![id, record.encode().to_vec()],
        ),
        Value::Rating(row) => conn.execute(
            "INSERT INTO ratings (id, points, updated_at, row) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                 points = excluded.points,
                 updated_at = excluded.updated_at,
                 row = excluded.row",
            params![
                id,
                sort_column(row.points),
                sort_column(row.updated_at),
                row.encode().to_vec()
            ],
        ),
        Value::Lottery(entry) => conn.execute(
            "INSERT INTO lottery (id, entered_at, entry) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                 entered_at = excluded.entered_at,
                 entry = excluded.entry",
            params![id, sort_column(entry.entered_at), entry.encode().to_vec()],
        ),
    }
    .with_context(|| format!("write {key:?}"))?;
    Ok(())
}

fn query_index(conn: &Connection, index: Index, limit: usize) -> Result<Vec<Value>> {
    let sql = match index {
        Index::RatingsByPoints => {
            "SELECT id, row FROM ratings ORDER BY points DESC, updated_at DESC, id ASC LIMIT ?1"
        }
        Index::LotteryByEnteredAt => {
            "SELECT id, entry FROM lottery ORDER BY entered_at DESC, id ASC LIMIT ?1"
        }
    };
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![limit], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
    })?;

    let mut values = Vec::new();
    for row in rows {
        let (id, bytes) = row?;
        let value = match index {
            Index::RatingsByPoints => Value::Rating(
                RatingRow::decode(&mut bytes.as_slice())
                    .with_context(|| format!("decode rating row {id}"))?,
            ),
            Index::LotteryByEnteredAt => Value::Lottery(
                LotteryEntry::decode(&mut bytes.as_slice())
                    .with_context(|| format!("decode lottery entry {id}"))?,
            ),
        };
        values.push(value);
    }
    Ok(values)
}

impl State for SqliteState {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        let key = key.clone();
        self.run(move |conn| read_value(conn, &key)).await
    }

    async fn insert(&self, key: Key, value: Value) -> Result<()> {
        self.run(move |conn| write_value(conn, &key, &value)).await
    }

    async fn apply(&self, changes: Vec<(Key, Value)>) -> Result<()> {
        self.run(move |conn| {
            let tx = conn.transaction().context("begin apply")?;
            for (key, value) in &changes {
                write_value(&tx, key, value)?;
            }
            tx.commit().context("commit apply")?;
            Ok(())
        })
        .await
    }

    async fn increment(&self, key: &Key, counter: Counter, delta: u64) -> Result<u64> {
        let key = key.clone();
        self.run(move |conn| {
            let tx = conn.transaction().context("begin increment")?;
            let mut value =
                read_value(&tx, &key)?.with_context(|| format!("no value to increment under {key:?}"))?;
            let count = value
                .bump(counter, delta)
                .with_context(|| format!("{counter:?} is not tracked under {key:?}"))?;
            write_value(&tx, &key, &value)?;
            tx.commit().context("commit increment")?;
            Ok(count)
        })
        .await
    }

    async fn query_top(&self, index: Index, limit: usize) -> Result<Vec<Value>> {
        self.run(move |conn| query_index(conn, index, limit)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nightmode_execution::{mocks::ManualClock, Engine};
    use nightmode_types::{PlayerId, ProgressionConfig, TapBatch};

    fn rating(platform_id: u64, points: u64, updated_at: u64) -> RatingRow {
        let id = PlayerId::from_platform_id(platform_id);
        RatingRow {
            display_name: id.to_string(),
            id,
            platform_id: Some(platform_id),
            points,
            level: 1,
            referrals: 0,
            updated_at,
        }
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nightmode.db");
        let id = PlayerId::from_platform_id(42);
        let mut record = PlayerRecord::new(id.clone(), 1_000);
        record.points = 12_345;
        record.username = Some("owl".to_string());

        {
            let state = SqliteState::open(&path).unwrap();
            state
                .insert(Key::Player(id.clone()), Value::Player(record.clone()))
                .await
                .unwrap();
        }

        let state = SqliteState::open(&path).unwrap();
        assert_eq!(
            state.get(&Key::Player(id.clone())).await.unwrap(),
            Some(Value::Player(record))
        );
        assert_eq!(state.get(&Key::Rating(id)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_insert_overwrites() {
        let state = SqliteState::open_in_memory().unwrap();
        let mut row = rating(1, 10, 1);
        let key = Key::Rating(row.id.clone());
        state.insert(key.clone(), Value::Rating(row.clone())).await.unwrap();
        row.points = 99;
        state.insert(key.clone(), Value::Rating(row.clone())).await.unwrap();
        assert_eq!(state.get(&key).await.unwrap(), Some(Value::Rating(row)));
    }

    #[tokio::test]
    async fn test_apply_rolls_back_on_bad_change() {
        let state = SqliteState::open_in_memory().unwrap();
        let good = rating(1, 10, 1);
        let bad = rating(2, 20, 1);
        let result = state
            .apply(vec![
                (Key::Rating(good.id.clone()), Value::Rating(good.clone())),
                (Key::Player(bad.id.clone()), Value::Rating(bad)),
            ])
            .await;
        assert!(result.is_err());
        assert_eq!(state.get(&Key::Rating(good.id)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_increment_counts() {
        let state = SqliteState::open_in_memory().unwrap();
        let row = rating(1, 10, 1);
        let key = Key::Rating(row.id.clone());
        state.insert(key.clone(), Value::Rating(row)).await.unwrap();

        assert_eq!(state.increment(&key, Counter::Referrals, 1).await.unwrap(), 1);
        assert_eq!(state.increment(&key, Counter::Referrals, 2).await.unwrap(), 3);

        let missing = Key::Player(PlayerId::from_platform_id(9));
        assert!(state.increment(&missing, Counter::Referrals, 1).await.is_err());
    }

    #[tokio::test]
    async fn test_query_top_orders_ratings() {
        let state = SqliteState::open_in_memory().unwrap();
        for row in [rating(1, 50, 1), rating(2, 80, 1), rating(3, 50, 9), rating(4, 5, 0)] {
            state
                .insert(Key::Rating(row.id.clone()), Value::Rating(row))
                .await
                .unwrap();
        }
        let top = state.query_top(Index::RatingsByPoints, 3).await.unwrap();
        let ids: Vec<_> = top
            .into_iter()
            .map(|value| match value {
                Value::Rating(row) => row.platform_id,
                other => panic!("unexpected value {other:?}"),
            })
            .collect();
        assert_eq!(ids, vec![Some(2), Some(3), Some(1)]);
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_an_error() {
        let state = SqliteState::open_in_memory().unwrap();
        let id = PlayerId::from_platform_id(1);
        state
            .run({
                let id = id.clone();
                move |conn| {
                    conn.execute(
                        "INSERT INTO players (id, record) VALUES (?1, ?2)",
                        params![id.as_str(), vec![0xffu8, 0xff]],
                    )?;
                    Ok(())
                }
            })
            .await
            .unwrap();
        assert!(state.get(&Key::Player(id)).await.is_err());
    }

    #[tokio::test]
    async fn test_engine_progress_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nightmode.db");
        let alice = PlayerId::from_platform_id(1);
        let bob = PlayerId::from_platform_id(2);

        {
            let clock = ManualClock::default();
            let engine = Engine::with_clock(
                SqliteState::open(&path).unwrap(),
                clock,
                ProgressionConfig::default(),
            );
            let tapped = engine
                .record_taps(&alice, TapBatch::new(12).unwrap())
                .await
                .unwrap();
            assert_eq!(tapped.accepted_taps, 10);
            assert_eq!(tapped.rejected_taps, 2);
            let bonus = engine.claim_daily_bonus(&alice).await.unwrap();
            assert_eq!(bonus.state.points, 1_010);
            let referral = engine.apply_referral(&alice, 2).await.unwrap();
            assert!(referral.applied);
            assert_eq!(referral.state.points, 30_000);
            engine.enter_lottery(&alice).await.unwrap();
        }

        let engine = Engine::with_clock(
            SqliteState::open(&path).unwrap(),
            ManualClock::default(),
            ProgressionConfig::default(),
        );
        let bob_state = engine.get_state(&bob).await.unwrap();
        assert_eq!(bob_state.points, 30_000);
        assert_eq!(bob_state.level, 4);
        assert_eq!(bob_state.referrals, 1);

        let board = engine.top_by_points(None).await.unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].points, 30_000);
        assert_eq!(board[1].points, 30_000);
        let bob_row = board.iter().find(|item| item.uid == bob).unwrap();
        assert_eq!(bob_row.referrals, 1);

        let entries = engine.lottery_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].uid, alice);
    }
}
