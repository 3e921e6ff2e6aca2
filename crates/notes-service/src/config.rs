//! Configuration loading and management

use std::path::Path;

use anyhow::{Context, Result};
use notes_core::NotesConfig;
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.json";

/// Main configuration for the notes service.
///
/// The core sections (`tokens`, `passwords`, `search`) sit at the top level
/// of `config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub notes: NotesConfig,
}

impl Config {
    /// Load configuration from the data directory.
    ///
    /// Writes a default `config.json` for reference when none exists.
    pub fn load(data_path: &Path) -> Result<Self> {
        let config_file = data_path.join(CONFIG_FILE);

        if config_file.exists() {
            let content = std::fs::read_to_string(&config_file)
                .with_context(|| format!("Failed to read config file: {:?}", config_file))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {:?}", config_file))?;
            tracing::info!("Loaded configuration from {:?}", config_file);
            Ok(config)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_file);
            let config = Config::default();

            std::fs::create_dir_all(data_path)
                .with_context(|| format!("Failed to create data directory: {:?}", data_path))?;

            let content = serde_json::to_string_pretty(&config)?;
            std::fs::write(&config_file, content)
                .with_context(|| format!("Failed to write default config: {:?}", config_file))?;
            tracing::info!("Created default config at {:?}", config_file);

            Ok(config)
        }
    }
}
