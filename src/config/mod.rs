//! Configuration file management
//!
//! Loads TOML configuration files and provides application settings.
//! Default config path: ~/.config/assetcore/config.toml

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::audio::PlayerKind;
use crate::constants::DEFAULT_GLOBAL_VOLUME;

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Font settings
    pub font: FontConfig,
    /// Audio settings
    pub audio: AudioConfig,
    /// Atlas debug output settings
    pub atlas: AtlasConfig,
}

/// Font settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Directory holding `.met`/`.fnt` pairs (`~` is expanded)
    pub data_dir: String,
    /// Font base name used when none is given on the command line
    pub default_font: String,
}

/// Audio settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Playback backend: "null" | "cpal"
    /// cpal needs the `cpal-backend` feature, otherwise null is used
    pub backend: PlayerKind,
    /// Global output volume (0.0-1.0)
    pub global_volume: f32,
}

/// Atlas debug output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// PNG dump directory (empty = current directory)
    pub dump_dir: String,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            data_dir: ".".to_string(),
            default_font: String::new(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            backend: PlayerKind::Null,
            global_volume: DEFAULT_GLOBAL_VOLUME,
        }
    }
}

impl FontConfig {
    /// Data directory with `~` expanded
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(expand_path(&self.data_dir))
    }
}

impl AtlasConfig {
    /// Dump directory with `~` expanded
    pub fn dump_dir(&self) -> PathBuf {
        if self.dump_dir.is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(expand_path(&self.dump_dir))
        }
    }
}

impl Config {
    /// Get config file path (in priority order)
    pub fn config_path() -> Option<PathBuf> {
        // 1. ASSETCORE_CONFIG environment variable
        if let Ok(path) = std::env::var("ASSETCORE_CONFIG") {
            let p = Path::new(&path);
            if p.exists() {
                return Some(p.to_path_buf());
            }
        }

        // 2. User config: ~/.config/assetcore/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("assetcore").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }
        }

        None
    }

    /// Load configuration with priority:
    /// 1. ASSETCORE_CONFIG environment variable
    /// 2. ~/.config/assetcore/config.toml
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            match Self::load_from_file(&path) {
                Ok(config) => {
                    info!("Loaded config: {}", path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Failed to load config {}: {}", path.display(), e);
                }
            }
        }
        info!("Using built-in default config");
        Self::default()
    }

    /// Load settings from specified path
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse TOML text; missing keys take their defaults
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.audio.global_volume = config.audio.global_volume.clamp(0.0, 1.0);
        Ok(config)
    }
}

/// Expand ~ to the user's home directory
pub fn expand_path(path: &str) -> String {
    if !path.starts_with('~') {
        return path.to_string();
    }

    match dirs::home_dir() {
        Some(home) if path == "~" => home.to_string_lossy().to_string(),
        Some(home) => format!("{}{}", home.to_string_lossy(), &path[1..]),
        None => path.to_string(),
    }
}
