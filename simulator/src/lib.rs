//! Local backend for nightmode: a durable SQLite `State` and file-based configuration.

mod config;
pub use config::{ConfigError, SimulatorConfig, ValidatedConfig};
mod sqlite;
pub use sqlite::SqliteState;
