//! Configuration management for roomplan
//!
//! Handles the application home directory and config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the data file, both in the home directory and as a bundled template
pub const DATA_FILE_NAME: &str = "building_data.json";
const LOG_FILE_NAME: &str = "error_log.txt";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Overrides `<home>/building_data.json`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
    /// Overrides `<home>/error_log.txt`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// Template copied in on first run when the data file is missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_file: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. "debug" or "roomplan=info"
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
        }
    }
}

/// Returns the roomplan home directory
///
/// `ROOMPLAN_HOME` wins; otherwise the platform local data dir.
pub fn roomplan_home() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os("ROOMPLAN_HOME") {
        return Ok(PathBuf::from(home));
    }
    let base = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .context("Could not determine home directory")?;
    Ok(base.join("roomplan"))
}

/// Returns paths to all roomplan files
#[derive(Debug, Clone)]
pub struct RoomplanPaths {
    pub root: PathBuf,
    pub config: PathBuf,
    pub data_file: PathBuf,
    pub log_file: PathBuf,
    /// Candidate template locations, tried in order
    pub templates: Vec<PathBuf>,
}

impl RoomplanPaths {
    pub fn new() -> Result<Self> {
        Ok(Self::at(roomplan_home()?))
    }

    /// Default layout under an explicit root
    pub fn at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config: root.join(CONFIG_FILE_NAME),
            data_file: root.join(DATA_FILE_NAME),
            log_file: root.join(LOG_FILE_NAME),
            templates: default_template_candidates(),
            root,
        }
    }

    /// Apply overrides from a loaded config
    pub fn with_config(mut self, config: &Config) -> Self {
        if let Some(data) = &config.data_file {
            self.data_file = data.clone();
        }
        if let Some(log) = &config.log_file {
            self.log_file = log.clone();
        }
        if let Some(template) = &config.template_file {
            self.templates.insert(0, template.clone());
        }
        self
    }

    /// Create the root directory if it doesn't exist
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.root).context("Failed to create roomplan root")?;
        if let Some(parent) = self.data_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("Failed to create data file directory")?;
            }
        }
        Ok(())
    }

    /// Check if roomplan has been initialized
    pub fn is_initialized(&self) -> bool {
        self.config.exists() && self.data_file.exists()
    }
}

/// Bundled template lookup: next to the executable, then the working directory
fn default_template_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.push(dir.join(DATA_FILE_NAME));
            candidates.push(dir.join("../Resources").join(DATA_FILE_NAME));
        }
    }
    candidates.push(PathBuf::from(DATA_FILE_NAME));
    candidates
}

/// Load configuration from `path`; a missing file yields defaults
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(path).context("Failed to read config.toml")?;
    toml::from_str(&content).context("Failed to parse config.toml")
}

/// Save configuration to `path`
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(path, content).context("Failed to write config.toml")?;
    Ok(())
}
