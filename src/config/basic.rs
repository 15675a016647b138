use courier_schema::SchemaVersion;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Basic (core) configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BasicConfig {
    /// Directory searched for, and holding new, store files.
    /// TOML: `basic.data_dir`. Default: `data`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Store file name, resolved against `data_dir`.
    /// TOML: `basic.database_file`. Default: `courier.db`.
    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// Log level for tracing subscriber initialization (e.g., "error", "warn", "info", "debug", "trace").
    /// TOML: `basic.loglevel`. Default: `info`.
    #[serde(default = "default_loglevel")]
    pub loglevel: String,

    /// Schema version the binary opens the store with.
    /// TOML: `basic.schema_version`. Default: `0`.
    #[serde(default)]
    pub schema_version: SchemaVersion,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_file: default_database_file(),
            loglevel: default_loglevel(),
            schema_version: 0,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_database_file() -> String {
    "courier.db".to_string()
}

fn default_loglevel() -> String {
    "info".to_string()
}
