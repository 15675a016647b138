use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the store connection and its worker.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// SQLite busy timeout.
    /// TOML: `store.busy_timeout_secs`. Default: `5`.
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,

    /// Open the store in WAL journal mode.
    /// TOML: `store.wal`. Default: `true`.
    #[serde(default = "default_true")]
    pub wal: bool,

    /// Run each schema phase (create, migrate, wipe, reseed) inside its own transaction.
    /// When off, a failing statement leaves earlier statements of the phase applied.
    /// TOML: `store.transactional_phases`. Default: `false`.
    #[serde(default)]
    pub transactional_phases: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout_secs: default_busy_timeout_secs(),
            wal: true,
            transactional_phases: false,
        }
    }
}

impl StoreConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }
}

fn default_busy_timeout_secs() -> u64 {
    5
}

fn default_true() -> bool {
    true
}
