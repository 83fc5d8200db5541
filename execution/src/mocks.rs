//! Test doubles for the engine: a settable clock and a state wrapper that can yield, fail, or
//! stall on demand.

use crate::{clock::Clock, state::State, Engine, Memory};
use anyhow::{bail, Result};
use nightmode_types::{
    storage::{Counter, Index, Key, Value},
    ProgressionConfig,
};
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

/// 2025-01-01T00:00:00Z
pub const GENESIS_MS: u64 = 1_735_689_600_000;

#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(GENESIS_MS)
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Wraps a backend with switches for forcing interleavings and failures.
pub struct FaultyState<S> {
    inner: S,
    yield_on_read: AtomicBool,
    fail_writes: AtomicBool,
    stall_reads: AtomicBool,
}

impl<S: State> FaultyState<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            yield_on_read: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            stall_reads: AtomicBool::new(false),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Yield to the scheduler before every read, widening race windows.
    pub fn set_yield_on_read(&self, enabled: bool) {
        self.yield_on_read.store(enabled, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::SeqCst);
    }

    /// Reads never complete while enabled.
    pub fn set_stall_reads(&self, enabled: bool) {
        self.stall_reads.store(enabled, Ordering::SeqCst);
    }

    async fn before_read(&self) {
        if self.stall_reads.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.yield_on_read.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
    }

    fn before_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("injected write failure");
        }
        Ok(())
    }
}

impl<S: State> State for FaultyState<S> {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        self.before_read().await;
        self.inner.get(key).await
    }

    async fn insert(&self, key: Key, value: Value) -> Result<()> {
        self.before_write()?;
        self.inner.insert(key, value).await
    }

    async fn apply(&self, changes: Vec<(Key, Value)>) -> Result<()> {
        self.before_write()?;
        self.inner.apply(changes).await
    }

    async fn increment(&self, key: &Key, counter: Counter, delta: u64) -> Result<u64> {
        self.before_write()?;
        self.inner.increment(key, counter, delta).await
    }

    async fn query_top(&self, index: Index, limit: usize) -> Result<Vec<Value>> {
        self.before_read().await;
        self.inner.query_top(index, limit).await
    }
}

/// In-memory engine on a manual clock starting at [`GENESIS_MS`].
pub fn memory_engine(config: ProgressionConfig) -> (Engine<Memory, ManualClock>, ManualClock) {
    let clock = ManualClock::default();
    let engine = Engine::with_clock(Memory::new(), clock.clone(), config);
    (engine, clock)
}

/// Engine over a [`FaultyState`]-wrapped memory backend.
pub fn faulty_engine(
    config: ProgressionConfig,
) -> (Engine<FaultyState<Memory>, ManualClock>, ManualClock) {
    let clock = ManualClock::default();
    let engine = Engine::with_clock(FaultyState::new(Memory::new()), clock.clone(), config);
    (engine, clock)
}
