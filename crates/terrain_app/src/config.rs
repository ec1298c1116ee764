//! App configuration (terrain, pacing, debug markers). Loaded from terrain.ron at startup.

use std::path::{Path, PathBuf};

use procgen::TerrainSettings;
use serde::{Deserialize, Serialize};

/// Default config file, looked up in the current directory.
pub const CONFIG_FILE: &str = "terrain.ron";

/// Presentation pacing: reveal the mesh a few cells per tick instead of all at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    pub enabled: bool,
    pub cells_per_tick: usize,
    /// Delay between ticks in milliseconds.
    pub tick_ms: u64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cells_per_tick: 1,
            tick_ms: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub terrain: TerrainSettings,
    /// Replace `terrain.noise.seed` with a random one on startup.
    pub random_seed: bool,
    pub reveal: RevealConfig,
    /// Log one marker per vertex position (debug level).
    pub draw_markers: bool,
}

impl AppConfig {
    /// Load config from `path`. A missing file yields defaults; an unreadable or invalid one
    /// logs a warning and yields defaults.
    pub fn load(path: &Path) -> Self {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {:?}, using defaults", path);
                return Self::default();
            }
            Err(e) => {
                log::warn!("Could not read config at {:?}: {}, using defaults", path, e);
                return Self::default();
            }
        };
        match Self::parse(&data) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Invalid config at {:?}: {}, using defaults", path, e);
                Self::default()
            }
        }
    }

    pub fn parse(data: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(data)
    }
}

/// Config path from the first CLI argument, else `terrain.ron` in the current directory.
pub fn config_path() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(CONFIG_FILE)
        })
}
