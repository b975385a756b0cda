use crate::domain::tuning::{GameplayTuning, TowerConfig};
use crate::use_cases::TowerSettings;
use serde::Deserialize;
use std::{env, path::PathBuf, time::Duration};
use thiserror::Error;

// Runtime/server constants (not gameplay tuning).

pub const COMMAND_CHANNEL_CAPACITY: usize = 1024;
pub const EVENT_BROADCAST_CAPACITY: usize = 128;
// Reset checks must run at least once per second.
pub const TICK_INTERVAL: Duration = Duration::from_millis(250);

pub fn http_port() -> u16 {
    env::var("TOWER_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

/// Fixed seed for reproducible towers; entropy-seeded when unset.
pub fn tower_seed() -> Option<u64> {
    env::var("TOWER_SEED").ok().and_then(|v| v.trim().parse().ok())
}

pub fn config_path() -> Option<PathBuf> {
    env::var_os("TOWER_CONFIG_PATH").map(PathBuf::from)
}

/// Tuning file contents. Every table and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub generation: TowerConfig,
    pub gameplay: GameplayTuning,
}

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

pub fn parse_server_config(text: &str) -> Result<ServerConfig, toml::de::Error> {
    toml::from_str(text)
}

/// Reads the tuning file named by `TOWER_CONFIG_PATH`, or the defaults.
pub fn load_server_config() -> Result<ServerConfig, ConfigFileError> {
    let Some(path) = config_path() else {
        return Ok(ServerConfig::default());
    };
    let text = std::fs::read_to_string(&path).map_err(|source| ConfigFileError::Read {
        path: path.clone(),
        source,
    })?;
    parse_server_config(&text).map_err(|source| ConfigFileError::Parse { path, source })
}

pub fn tower_settings(gameplay: &GameplayTuning) -> TowerSettings {
    TowerSettings {
        command_channel_capacity: COMMAND_CHANNEL_CAPACITY,
        event_broadcast_capacity: EVENT_BROADCAST_CAPACITY,
        tick_interval: TICK_INTERVAL,
        autosave_interval: Duration::from_secs(gameplay.autosave_interval_secs.max(1)),
    }
}
