use thiserror::Error;

/// Infrastructure failures surfaced by the engine.
///
/// Business refusals (tap limit, bonus cooldown, duplicate referral) are not errors; they are
/// reported through the `rejection` field of each outcome.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] anyhow::Error),
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
