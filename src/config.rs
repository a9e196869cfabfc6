//! Engine configuration
//!
//! Loaded from `<config dir>/dashgrid/config.json`; a default file is written on
//! first run. Environment variables override the remote endpoints and the
//! fallback-store directory after load.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::catalog::{DefaultPositionTable, WidgetCatalog};
use crate::constants::{config, grid, remote, storage, validation};
use crate::persistence::{EnvCredential, FileStore};
use crate::snapping::GridMetrics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub grid: GridConfig,
    /// JSON widget catalog replacing the built-in one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
    /// JSON default position table replacing the built-in one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults_path: Option<PathBuf>,
}

/// Remote layout store and capability source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities_url: Option<String>,
    /// Env var carrying the bearer token
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Fallback-store directory; platform data dir when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_storage_key")]
    pub key: String,
}

/// Minimum container width mapped to a column count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub name: String,
    pub min_width: u32,
    pub columns: u32,
}

impl Breakpoint {
    fn new(name: &str, min_width: u32, columns: u32) -> Self {
        Self {
            name: name.to_string(),
            min_width,
            columns,
        }
    }
}

/// Grid geometry consumed by the renderer and the interaction controllers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_breakpoints")]
    pub breakpoints: Vec<Breakpoint>,
    #[serde(default = "default_row_height")]
    pub row_height: u32,
    #[serde(default = "default_margin")]
    pub margin: [u32; 2],
    #[serde(default = "default_container_padding")]
    pub container_padding: [u32; 2],
}

// Default value functions
fn default_token_env() -> String {
    config::DEFAULT_TOKEN_ENV.to_string()
}

fn default_timeout_secs() -> u64 {
    remote::DEFAULT_TIMEOUT_SECS
}

fn default_storage_key() -> String {
    storage::LAYOUT_KEY.to_string()
}

fn default_breakpoints() -> Vec<Breakpoint> {
    vec![
        Breakpoint::new("lg", 1200, 12),
        Breakpoint::new("md", 996, 10),
        Breakpoint::new("sm", 768, 6),
        Breakpoint::new("xs", 480, 4),
        Breakpoint::new("xxs", 0, 2),
    ]
}

fn default_row_height() -> u32 {
    grid::DEFAULT_ROW_HEIGHT
}

fn default_margin() -> [u32; 2] {
    grid::DEFAULT_MARGIN
}

fn default_container_padding() -> [u32; 2] {
    grid::DEFAULT_CONTAINER_PADDING
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            layout_url: None,
            capabilities_url: None,
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            dir: None,
            key: default_storage_key(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            breakpoints: default_breakpoints(),
            row_height: default_row_height(),
            margin: default_margin(),
            container_padding: default_container_padding(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: RemoteSettings::default(),
            storage: StorageSettings::default(),
            grid: GridConfig::default(),
            catalog_path: None,
            defaults_path: None,
        }
    }
}

impl GridConfig {
    /// Breakpoint for a container width: the widest one whose minimum fits
    pub fn breakpoint_for_width(&self, width: u32) -> Option<&Breakpoint> {
        self.breakpoints
            .iter()
            .filter(|bp| bp.min_width <= width)
            .max_by_key(|bp| bp.min_width)
            .or_else(|| self.breakpoints.iter().min_by_key(|bp| bp.min_width))
    }

    pub fn columns_for_width(&self, width: u32) -> u32 {
        self.breakpoint_for_width(width).map_or(1, |bp| bp.columns.max(1))
    }

    pub fn metrics(&self, width: u32) -> GridMetrics {
        GridMetrics::new(
            width,
            self.columns_for_width(width),
            self.row_height,
            self.margin,
            self.container_padding,
        )
    }
}

impl RemoteSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn credential(&self) -> EnvCredential {
        EnvCredential::new(self.token_env.clone())
    }
}

impl StorageSettings {
    pub fn fallback_store(&self) -> FileStore {
        match &self.dir {
            Some(dir) => FileStore::new(dir, &self.key),
            None => FileStore::default_location(&self.key),
        }
    }
}

impl Config {
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::FILENAME);
        path
    }

    /// Load the config file, writing a default one when missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            let config: Config = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;
            info!(path = %path.display(), "Loaded config");
            config
        } else {
            let config = Config::default();
            match config.save_to(path) {
                Ok(()) => info!(path = %path.display(), "Generated default config file"),
                Err(e) => warn!(path = %path.display(), error = ?e, "Failed to write default config"),
            }
            config
        };

        config.apply_env_overrides(|var| env::var(var).ok());
        config.validate_and_clamp();
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        fs::write(path, json).with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Override endpoints and storage dir from `lookup` (the process environment in production)
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = non_empty(config::ENV_LAYOUT_URL) {
            self.remote.layout_url = Some(url);
        }
        if let Some(url) = non_empty(config::ENV_CAPABILITIES_URL) {
            self.remote.capabilities_url = Some(url);
        }
        if let Some(dir) = non_empty(config::ENV_STORAGE_DIR) {
            self.storage.dir = Some(PathBuf::from(dir));
        }
    }

    /// Validate and clamp config values to safe ranges
    pub fn validate_and_clamp(&mut self) {
        if self.remote.timeout_secs == 0 {
            warn!(using = default_timeout_secs(), "timeout_secs is zero, using default");
            self.remote.timeout_secs = default_timeout_secs();
        } else if self.remote.timeout_secs > remote::MAX_TIMEOUT_SECS {
            warn!(timeout_secs = self.remote.timeout_secs, max = remote::MAX_TIMEOUT_SECS, "timeout_secs exceeds maximum, clamping");
            self.remote.timeout_secs = remote::MAX_TIMEOUT_SECS;
        }

        if self.storage.key.trim().is_empty() {
            warn!(using = storage::LAYOUT_KEY, "storage key is empty, using default");
            self.storage.key = default_storage_key();
        }

        if self.grid.breakpoints.is_empty() {
            warn!("breakpoint table is empty, using defaults");
            self.grid.breakpoints = default_breakpoints();
        }
        for bp in &mut self.grid.breakpoints {
            if bp.columns == 0 {
                warn!(breakpoint = %bp.name, "breakpoint has zero columns, using 1");
                bp.columns = 1;
            } else if bp.columns > validation::MAX_COLUMNS {
                warn!(breakpoint = %bp.name, columns = bp.columns, max = validation::MAX_COLUMNS, "breakpoint columns exceed maximum, clamping");
                bp.columns = validation::MAX_COLUMNS;
            }
        }

        if self.grid.row_height == 0 {
            warn!(using = default_row_height(), "row_height is zero, using default");
            self.grid.row_height = default_row_height();
        } else if self.grid.row_height > validation::MAX_ROW_HEIGHT {
            warn!(row_height = self.grid.row_height, max = validation::MAX_ROW_HEIGHT, "row_height exceeds maximum, clamping");
            self.grid.row_height = validation::MAX_ROW_HEIGHT;
        }
    }

    /// Widget catalog from `catalog_path`, or the built-in one
    pub fn catalog(&self) -> Result<WidgetCatalog> {
        match &self.catalog_path {
            Some(path) => WidgetCatalog::load(path),
            None => Ok(WidgetCatalog::builtin()),
        }
    }

    /// Default position table from `defaults_path`, or the built-in one
    pub fn defaults(&self) -> Result<DefaultPositionTable> {
        match &self.defaults_path {
            Some(path) => DefaultPositionTable::load(path),
            None => Ok(DefaultPositionTable::builtin()),
        }
    }
}
