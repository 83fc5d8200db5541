use crate::leaderboard::{lottery_order, rank_order};
use anyhow::{anyhow, bail, Context as _, Result};
use nightmode_types::storage::{Counter, Index, Key, Value};
use std::{
    collections::{BTreeMap, HashMap},
    future::Future,
    sync::{Mutex, MutexGuard},
};

/// Keyed record store backing the engine.
///
/// Backends are shared between concurrent operations and synchronize internally. Every write
/// path is an upsert; `apply` must commit all of its changes or none of them.
pub trait State: Send + Sync {
    fn get(&self, key: &Key) -> impl Future<Output = Result<Option<Value>>> + Send;
    fn insert(&self, key: Key, value: Value) -> impl Future<Output = Result<()>> + Send;
    fn apply(&self, changes: Vec<(Key, Value)>) -> impl Future<Output = Result<()>> + Send;

    /// Adds `delta` to `counter` on the value stored under `key` and returns the new count.
    ///
    /// The engine stages referral counts through [`Staged::increment`] so they commit in the same
    /// `apply` as the records they belong to.
    fn increment(
        &self,
        key: &Key,
        counter: Counter,
        delta: u64,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Up to `limit` values from `index`, in index order.
    fn query_top(&self, index: Index, limit: usize)
        -> impl Future<Output = Result<Vec<Value>>> + Send;
}

#[derive(Default)]
pub struct Memory {
    state: Mutex<HashMap<Key, Value>>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|state| state.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Key, Value>>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("memory state lock poisoned"))
    }
}

fn ensure_kind(key: &Key, value: &Value) -> Result<()> {
    if !value.matches(key) {
        bail!("value kind does not match key {key:?}");
    }
    Ok(())
}

impl State for Memory {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn insert(&self, key: Key, value: Value) -> Result<()> {
        ensure_kind(&key, &value)?;
        self.lock()?.insert(key, value);
        Ok(())
    }

    async fn apply(&self, changes: Vec<(Key, Value)>) -> Result<()> {
        // Validate everything before touching the map so a bad change leaves no partial write.
        for (key, value) in &changes {
            ensure_kind(key, value)?;
        }
        let mut state = self.lock()?;
        state.extend(changes);
        Ok(())
    }

    async fn increment(&self, key: &Key, counter: Counter, delta: u64) -> Result<u64> {
        let mut state = self.lock()?;
        let value = state
            .get_mut(key)
            .with_context(|| format!("no value to increment under {key:?}"))?;
        value
            .bump(counter, delta)
            .with_context(|| format!("{counter:?} is not tracked under {key:?}"))
    }

    async fn query_top(&self, index: Index, limit: usize) -> Result<Vec<Value>> {
        let state = self.lock()?;
        let values: Vec<Value> = match index {
            Index::RatingsByPoints => {
                let mut rows: Vec<_> = state
                    .values()
                    .filter_map(|value| match value {
                        Value::Rating(row) => Some(row.clone()),
                        _ => None,
                    })
                    .collect();
                rows.sort_by(rank_order);
                rows.into_iter().take(limit).map(Value::Rating).collect()
            }
            Index::LotteryByEnteredAt => {
                let mut entries: Vec<_> = state
                    .values()
                    .filter_map(|value| match value {
                        Value::Lottery(entry) => Some(entry.clone()),
                        _ => None,
                    })
                    .collect();
                entries.sort_by(lottery_order);
                entries.into_iter().take(limit).map(Value::Lottery).collect()
            }
        };
        Ok(values)
    }
}

/// Write overlay for a single engine operation.
///
/// Reads fall through to the underlying state; writes stay pending until `commit` hands them to
/// `State::apply` in one batch.
pub struct Staged<'a, S: State> {
    state: &'a S,
    pending: BTreeMap<Key, Value>,
}

impl<'a, S: State> Staged<'a, S> {
    pub fn new(state: &'a S) -> Self {
        Self {
            state,
            pending: BTreeMap::new(),
        }
    }

    pub async fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(match self.pending.get(key) {
            Some(value) => Some(value.clone()),
            None => self.state.get(key).await?,
        })
    }

    pub fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, value);
    }

    /// Stages an increment of `counter` under `key` and returns the new count.
    pub async fn increment(&mut self, key: &Key, counter: Counter, delta: u64) -> Result<u64> {
        let mut value = self
            .get(key)
            .await?
            .with_context(|| format!("no value to increment under {key:?}"))?;
        let count = value
            .bump(counter, delta)
            .with_context(|| format!("{counter:?} is not tracked under {key:?}"))?;
        self.pending.insert(key.clone(), value);
        Ok(count)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Writes every pending change atomically. Returns the number of keys written.
    pub async fn commit(self) -> Result<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        let changes: Vec<_> = self.pending.into_iter().collect();
        let written = changes.len();
        self.state.apply(changes).await.context("commit staged changes")?;
        Ok(written)
    }
}
