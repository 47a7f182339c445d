//! Configuration loading and management.

use crate::board::drag::DEFAULT_ACTIVATION_DISTANCE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Project-local config file.
pub const LOCAL_CONFIG_PATH: &str = ".kanban/config.yaml";

/// Default HTTP API port.
pub const DEFAULT_PORT: u16 = 31995;

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub board: BoardConfig,
}

/// Server-specific configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Address the HTTP API binds to.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".kanban/tasks.db")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Board interaction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Pointer travel in pixels before a press becomes a drag.
    #[serde(default = "default_activation_distance")]
    pub activation_distance_px: f64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            activation_distance_px: default_activation_distance(),
        }
    }
}

fn default_activation_distance() -> f64 {
    DEFAULT_ACTIVATION_DISTANCE
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Resolve configuration for a run.
    ///
    /// An explicit path must load. Otherwise the first of
    /// `./.kanban/config.yaml` and `~/.kanban/config.yaml` that exists is
    /// used, falling back to defaults. Environment overrides apply last.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => Self::discover()?,
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn discover() -> Result<Self> {
        let mut candidates = vec![PathBuf::from(LOCAL_CONFIG_PATH)];
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(LOCAL_CONFIG_PATH));
        }

        for path in candidates {
            if path.is_file() {
                debug!(path = %path.display(), "Loading config");
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    /// Apply `KANBAN_*` overrides. Unparseable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db_path) = lookup("KANBAN_DB_PATH") {
            self.server.db_path = PathBuf::from(db_path);
        }

        if let Some(host) = lookup("KANBAN_HOST") {
            self.server.host = host;
        }

        if let Some(port) = lookup("KANBAN_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }

        if let Some(distance) = lookup("KANBAN_ACTIVATION_DISTANCE").and_then(|d| d.parse().ok()) {
            self.board.activation_distance_px = distance;
        }
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.server.db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}
