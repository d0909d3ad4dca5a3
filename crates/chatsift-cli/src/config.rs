//! Watcher configuration.

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Ordered category table plus extraction rules (YAML).
    #[serde(default = "default_categories_path")]
    pub categories_path: PathBuf,
    /// Subject name-to-id registry (YAML).
    #[serde(default = "default_subjects_path")]
    pub subjects_path: PathBuf,
    /// Persisted excluded-tag set (JSON); created on first save.
    #[serde(default = "default_exclusions_path")]
    pub exclusions_path: PathBuf,
    /// Processing tick interval in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Server identity for the session key; empty means local.
    #[serde(default)]
    pub server: String,
    /// Dimension for the session key.
    #[serde(default)]
    pub dimension: i32,
}

fn default_categories_path() -> PathBuf {
    PathBuf::from("config/categories.yml")
}

fn default_subjects_path() -> PathBuf {
    PathBuf::from("config/subjects.yml")
}

fn default_exclusions_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chatsift")
        .join("excluded_tags.json")
}

fn default_tick_ms() -> u64 {
    50
}

impl Default for Config {
    fn default() -> Self {
        Self {
            categories_path: default_categories_path(),
            subjects_path: default_subjects_path(),
            exclusions_path: default_exclusions_path(),
            tick_ms: default_tick_ms(),
            server: String::new(),
            dimension: 0,
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from the default location (config/default.toml) or fall
    /// back to defaults.
    pub fn load() -> Result<Self> {
        let config_path = PathBuf::from("config/default.toml");
        if config_path.exists() {
            return Self::load_from(&config_path);
        }
        Ok(Config::default())
    }
}
