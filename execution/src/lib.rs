//! Nightmode progression engine.
//!
//! Players tap to earn points, climb a two-tier level curve, claim a daily bonus, invite
//! friends for a level boost and enter a lottery. All of it runs through [`Engine`], which
//! owns a [`State`] backend and serializes work per player.
//!
//! ## Consistency
//! - Every mutation of a player happens under that player's lock, so concurrent taps and bonus
//!   claims never lose updates.
//! - A referral locks both players in id order and commits all four writes (two records, two
//!   rating rows) through one atomic `State::apply`.
//! - Business refusals come back as outcomes with a `rejection`; only storage failures and
//!   timeouts are returned as [`Error`].
//!
//! ## Example
//! ```rust,ignore
//! use nightmode_execution::{Engine, Memory};
//! use nightmode_types::{PlayerId, ProgressionConfig, TapBatch};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let engine = Engine::new(Memory::new(), ProgressionConfig::default());
//! let player = PlayerId::from_platform_id(42);
//! let outcome = engine.record_taps(&player, TapBatch::new(5)?).await?;
//! assert_eq!(outcome.accepted_taps, 5);
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod curve;
mod engine;
mod error;
pub mod leaderboard;
pub mod locks;
pub mod projection;
pub mod state;
pub mod throttle;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

#[cfg(test)]
mod concurrency_tests;

pub use clock::{Clock, SystemClock};
pub use engine::Engine;
pub use error::Error;
pub use leaderboard::Leaderboard;
pub use state::{Memory, Staged, State};
