// Configuration loading from YAML
//
// Every field has a default, so a missing file or a file that sets only a
// few keys is fine.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_DIR_NAME: &str = "taskport";
const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub limits: Limits,

    #[serde(default)]
    pub app: AppConfig,
}

/// Maximum field lengths, counted in UTF-16 code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    #[serde(default = "default_task_name_max")]
    pub task_name_max: usize,

    #[serde(default = "default_description_max")]
    pub description_max: usize,

    #[serde(default = "default_category_name_max")]
    pub category_name_max: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            task_name_max: default_task_name_max(),
            description_max: default_description_max(),
            category_name_max: default_category_name_max(),
        }
    }
}

impl Limits {
    /// Limits that accept any length, for reading bundles we wrote ourselves
    pub fn unbounded() -> Self {
        Self {
            task_name_max: usize::MAX,
            description_max: usize::MAX,
            category_name_max: usize::MAX,
        }
    }
}

fn default_task_name_max() -> usize {
    40
}

fn default_description_max() -> usize {
    350
}

fn default_category_name_max() -> usize {
    20
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin that share links must point at, e.g. `https://todo.example.com`.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Where `export` writes bundles when no `--out` is given.
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            export_dir: default_export_dir(),
        }
    }
}

fn default_origin() -> String {
    "http://localhost".to_string()
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Config {
    /// Load from an explicit path. The file must exist.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file is valid and means "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content).context("Failed to parse YAML config")?;
        Ok(config)
    }

    /// Load `explicit` if given, otherwise the per-user config file if it
    /// exists, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                debug!(path = ?path, "Loading user config");
                Self::from_file(&path)
            }
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }
}

/// `<config dir>/taskport/config.yaml`, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
