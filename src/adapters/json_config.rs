//! JSON file configuration adapter.
//!
//! Implements [`ConfigPort`] on top of a single JSON document.  Missing
//! keys fall back to their defaults; a missing file yields the full
//! default configuration.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::info;

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::PetConfig;

/// Config store backed by a JSON file on disk.
pub struct JsonFileConfig {
    path: PathBuf,
}

impl JsonFileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPort for JsonFileConfig {
    fn load(&self) -> Result<PetConfig, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("JsonFileConfig: {} not found, using defaults", self.path.display());
                return Ok(PetConfig::default());
            }
            Err(_) => return Err(ConfigError::IoError),
        };
        let cfg: PetConfig = serde_json::from_str(&text).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        info!("JsonFileConfig: loaded {}", self.path.display());
        Ok(cfg)
    }

    fn save(&self, config: &PetConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let text = serde_json::to_string_pretty(config).map_err(|_| ConfigError::IoError)?;
        fs::write(&self.path, text).map_err(|_| ConfigError::IoError)?;
        info!("JsonFileConfig: saved {}", self.path.display());
        Ok(())
    }
}
