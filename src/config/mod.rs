use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::LoggingConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizerConfig {
    /// Root of the image tree to sanitize.
    pub root: PathBuf,
    /// Quality used when re-encoding mismatched files as JPEG (1-100).
    pub jpeg_quality: u8,
    /// Follow directory symlinks during traversal. Visited-directory
    /// tracking keeps symlink cycles from looping the walk.
    pub follow_symlinks: bool,
    pub logging: LoggingConfig,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
            jpeg_quality: 75,
            follow_symlinks: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl SanitizerConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;

        if content.trim_start().starts_with('{') {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(toml::from_str(&content)?)
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
        let content = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.root.as_os_str().is_empty() {
            errors.push("Root directory must not be empty".to_string());
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            errors.push("JPEG quality must be in 1..=100".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone)]
pub enum ConfigFormat {
    Json,
    Toml,
}

pub fn load_config_or_default(config_path: Option<&str>) -> SanitizerConfig {
    match config_path {
        Some(path) => {
            match SanitizerConfig::load_from_file(path) {
                Ok(config) => {
                    if let Err(errors) = config.validate() {
                        eprintln!("Configuration validation errors:");
                        for error in errors {
                            eprintln!("  - {}", error);
                        }
                        eprintln!("Using default configuration instead.");
                        SanitizerConfig::default()
                    } else {
                        config
                    }
                }
                Err(e) => {
                    eprintln!("Failed to load config from '{}': {}", path, e);
                    eprintln!("Using default configuration.");
                    SanitizerConfig::default()
                }
            }
        }
        None => SanitizerConfig::default(),
    }
}
