//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the surf-config.toml file.
//! It provides a centralized way to configure the upstream forecast provider, polling
//! cadence, the HTTP listener, display options, and the list of surf spots.
//!
//! The provider credential is not part of the file. It is read from the environment
//! variable named by `upstream.api_key_env` each time a request is made.

use crate::conditions::DEFAULT_HOURLY_ROWS;
use crate::spots::default_spots;
use crate::SurfSpot;
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Default config file name, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "surf-config.toml";

/// Application configuration loaded from surf-config.toml
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    /// Surf spots to track, in display order
    #[serde(default = "default_spots")]
    pub spots: Vec<SurfSpot>,
}

/// Inbound HTTP listener
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Address for the HTTP endpoint (e.g., "0.0.0.0:3000")
    pub bind_addr: String,
}

/// Point-forecast provider settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Point-forecast endpoint, shared by the wind and wave requests
    pub endpoint: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Refuse to merge when wind and wave timestamp axes differ.
    /// Off by default: the payloads are merged by index and a warning is logged.
    pub strict_axis: bool,
}

/// Per-spot refresh behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollerConfig {
    /// Minutes between refreshes of each spot
    pub interval_minutes: u64,
    /// Keep showing the last good forecast after a failed refresh
    pub keep_last_good: bool,
}

/// Terminal report settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Rows in the hourly forecast table
    pub hourly_rows: usize,
    /// Offset from UTC used to print forecast times (600 = AEST)
    pub utc_offset_minutes: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig {
            endpoint: "https://api.windy.com/api/point-forecast/v2".to_string(),
            api_key_env: "SURF_API_KEY".to_string(),
            timeout_secs: 30,
            strict_axis: false,
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        PollerConfig {
            interval_minutes: 30,
            keep_last_good: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            hourly_rows: DEFAULT_HOURLY_ROWS,
            utc_offset_minutes: 600,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            poller: PollerConfig::default(),
            display: DisplayConfig::default(),
            spots: default_spots(),
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PollerConfig {
    /// Refresh interval. Zero is raised to one minute.
    pub fn interval(&self) -> Duration {
        if self.interval_minutes == 0 {
            warn!("poller.interval_minutes is 0, polling every minute instead");
        }
        Duration::from_secs(self.interval_minutes.max(1).saturating_mul(60))
    }
}

impl DisplayConfig {
    /// Offset used for printed times. Falls back to UTC outside ±24h.
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60)).unwrap_or_else(|| {
            warn!(
                utc_offset_minutes = self.utc_offset_minutes,
                "display.utc_offset_minutes out of range, printing UTC times"
            );
            Utc.fix()
        })
    }
}

impl Config {
    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        spots = config.spots.len(),
                        "Loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    warn!("Invalid config file format: {}", e);
                    warn!("Using default configuration (Sydney spots)");
                    Self::default()
                }
            },
            Err(_) => {
                info!(
                    "No config file at {}, using default configuration (Sydney spots)",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Save current configuration to the given path
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }
}
