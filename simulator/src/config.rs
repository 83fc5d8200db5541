use nightmode_types::{
    clicker::{MAX_LEADERBOARD_LIMIT, MAX_LOTTERY_LISTING},
    ProgressionConfig,
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, str::FromStr};
use thiserror::Error;
use tracing::Level;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: u64 },
    #[error("{field} must be at most {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: u64,
        max: u64,
    },
    #[error("database_path must not be empty")]
    EmptyDatabasePath,
}

/// File-backed settings for the local backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// SQLite file. When unset, players live in memory for a single command only.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub progression: ProgressionConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            log_level: default_log_level(),
            progression: ProgressionConfig::default(),
        }
    }
}

pub struct ValidatedConfig {
    pub database_path: Option<PathBuf>,
    pub log_level: Level,
    pub progression: ProgressionConfig,
}

fn ensure_nonzero(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidNonZero { field, value });
    }
    Ok(())
}

fn ensure_at_most(field: &'static str, value: u64, max: u64) -> Result<(), ConfigError> {
    if value > max {
        return Err(ConfigError::OutOfRange { field, value, max });
    }
    Ok(())
}

impl SimulatorConfig {
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;
        if self
            .database_path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            return Err(ConfigError::EmptyDatabasePath);
        }

        let progression = &self.progression;
        ensure_nonzero(
            "progression.max_taps_per_second",
            u64::from(progression.max_taps_per_second),
        )?;
        ensure_nonzero(
            "progression.daily_bonus_per_level",
            progression.daily_bonus_per_level,
        )?;
        ensure_nonzero(
            "progression.referral_bonus_levels",
            u64::from(progression.referral_bonus_levels),
        )?;
        ensure_nonzero(
            "progression.leaderboard_limit",
            progression.leaderboard_limit as u64,
        )?;
        ensure_at_most(
            "progression.leaderboard_limit",
            progression.leaderboard_limit as u64,
            MAX_LEADERBOARD_LIMIT as u64,
        )?;
        ensure_nonzero(
            "progression.lottery_listing_limit",
            progression.lottery_listing_limit as u64,
        )?;
        ensure_at_most(
            "progression.lottery_listing_limit",
            progression.lottery_listing_limit as u64,
            MAX_LOTTERY_LISTING as u64,
        )?;
        if let Some(timeout_ms) = progression.request_timeout_ms {
            ensure_nonzero("progression.request_timeout_ms", timeout_ms)?;
        }

        Ok(ValidatedConfig {
            database_path: self.database_path,
            log_level,
            progression: self.progression,
        })
    }
}
