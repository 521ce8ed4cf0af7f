//! `config.toml`
//!
//! The config file lives next to the session state in the [config dir](e6f_common::config_dir).
//! It is created from the embedded default on first run.
use std::path::{Path, PathBuf};

use e6f_api::ApiConfig;
use e6f_common::config_dir;
use e6f_filter::config::BlacklistConfig;
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::fs::{read_to_string, write};

use crate::error::AppError;

/// Default content written on first run.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("config.toml");

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub blacklist: BlacklistConfig,
    pub api: ApiConfig,
}

impl AppConfig {
    /// Parses a whole config file.
    ///
    /// # Errors
    /// Fails if the content isn't valid TOML or doesn't match the expected tables.
    pub fn from_config(config_content: &str) -> Result<Self, toml::de::Error> {
        let config = toml::from_str::<Self>(config_content)?;
        debug!(
            "Config decoded: {} blacklist lines, {}ms request delay",
            config.blacklist.filters.len(),
            config.api.delay().as_millis()
        );
        Ok(config)
    }

    /// Reads `config.toml` from `dir`, writing the default one first if it doesn't exist.
    pub async fn load_from(dir: &Path) -> Result<Self, AppError> {
        let path = dir.join(CONFIG_FILE);

        let content = if path.exists() {
            read_to_string(&path).await?
        } else {
            debug!("Writing default config to {}", path.display());
            write(&path, DEFAULT_CONFIG_TOML).await?;
            DEFAULT_CONFIG_TOML.to_string()
        };

        Ok(Self::from_config(&content)?)
    }

    /// [`load_from`](Self::load_from) on the default config dir.
    pub async fn load() -> Result<(Self, PathBuf), AppError> {
        let dir = config_dir()?;
        let config = Self::load_from(&dir).await?;
        Ok((config, dir))
    }
}
