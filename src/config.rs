use crate::error::{FreddyError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default scratch directory, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = ".freddy_cache";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub giphy_api_key: Option<String>,
    pub cache_dir: PathBuf,
    /// espeak voice name (e.g. `en-us`); espeak's default when unset.
    pub voice: Option<String>,
    /// Side of the square frame every clip is scaled to.
    pub frame_size: u32,
    pub font_size: u32,
    /// espeak speaking rate in words per minute; espeak's default when unset.
    pub speed: Option<u32>,
    /// Giphy content rating filter.
    pub rating: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            giphy_api_key: None,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            voice: None,
            frame_size: 720,
            font_size: 24,
            speed: None,
            rating: "g".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                config = Self::from_toml(&contents)?;
            }
        }

        // Override with environment variables
        if let Ok(key) = std::env::var("GIPHY_API_KEY") {
            config.giphy_api_key = Some(key);
        }
        if let Ok(dir) = std::env::var("FREDDY_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Ok(voice) = std::env::var("FREDDY_VOICE") {
            config.voice = Some(voice);
        }

        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| FreddyError::Config(format!("Invalid config file: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        if self.giphy_api_key.is_none() {
            return Err(FreddyError::Config(
                "GIPHY_API_KEY not set. Get one at https://developers.giphy.com/dashboard/"
                    .to_string(),
            ));
        }

        if self.frame_size == 0 {
            return Err(FreddyError::Config(
                "Frame size must be greater than 0".to_string(),
            ));
        }

        if self.font_size == 0 {
            return Err(FreddyError::Config(
                "Font size must be greater than 0".to_string(),
            ));
        }

        if self.speed == Some(0) {
            return Err(FreddyError::Config(
                "Speed must be greater than 0".to_string(),
            ));
        }

        if !matches!(self.rating.as_str(), "g" | "pg" | "pg-13" | "r") {
            return Err(FreddyError::Config(format!(
                "Unknown Giphy rating '{}'. Use g, pg, pg-13 or r",
                self.rating
            )));
        }

        Ok(())
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("freddy").join("config.toml"))
    }
}
