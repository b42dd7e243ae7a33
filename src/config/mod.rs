//! This module handles the service configuration, including loading and saving
//! operator settings to a `settings.toml` file.
//!
//! # Examples
//!
//! ```no_run
//! use road_guard::config::{self, Config};
//!
//! // Load existing configuration
//! let mut config = config::load().unwrap_or_default();
//!
//! // Modify a setting
//! config.confidence_threshold = Some(0.4);
//!
//! // Save the modified configuration
//! config::save(&config).expect("Failed to save config");
//! ```

use crate::error::Result;
use crate::media::detector::DEFAULT_CONFIDENCE_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "settings.toml";
const APP_NAME: &str = "RoadGuard";

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// URL the detection model is downloaded from.
    pub model_url: Option<String>,
    /// Where the model file lives; defaults to the platform data directory.
    #[serde(default)]
    pub model_path: Option<PathBuf>,
    /// Expected BLAKE3 hash of the model file, checked before loading.
    #[serde(default)]
    pub model_checksum: Option<String>,
    /// Detection confidence threshold.
    #[serde(default)]
    pub confidence_threshold: Option<f32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_url: None,
            model_path: None,
            model_checksum: None,
            confidence_threshold: Some(DEFAULT_CONFIDENCE_THRESHOLD),
        }
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

pub fn load() -> Result<Config> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(Config::default())
}

pub fn save(config: &Config) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content).unwrap_or_default())
}

pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}
