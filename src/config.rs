use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};
use tracing::warn;

use crate::gemini::{DEFAULT_API_BASE, DEFAULT_MODEL};

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// On-disk settings, all optional.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub api_base: Option<String>,
}

/// Values actually used for this run after CLI, environment and file are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
}

/// Command-line overrides, highest priority.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model: Option<String>,
    pub api_base: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::new()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("gemini-tui").join("config.json"))
    }

    /// Merge with the environment key and CLI overrides.
    ///
    /// Priority: overrides, then `env_key` (for the API key only), then this
    /// file, then built-in defaults. Blank values count as absent.
    pub fn resolve(self, env_key: Option<String>, overrides: Overrides) -> Settings {
        Settings {
            api_key: non_empty(env_key).or_else(|| non_empty(self.api_key)),
            model: non_empty(overrides.model)
                .or_else(|| non_empty(self.model))
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_base: non_empty(overrides.api_base)
                .or_else(|| non_empty(self.api_base))
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        }
    }
}
