// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Yombool Contributors

//! Application configuration

use crate::io::StlEncoding;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "yombool.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory exported files are written to
    pub output_dir: PathBuf,
    /// File name stem of exported files
    pub output_stem: String,
    /// STL flavour written on save
    pub encoding: StlEncoding,
    /// Seed for material colors; random when unset
    pub color_seed: Option<u64>,
    /// Ring the terminal bell when an operation completes
    pub bell: bool,
    /// Default tracing filter, used when RUST_LOG is unset
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            output_stem: "output".to_string(),
            encoding: StlEncoding::Binary,
            color_seed: None,
            bell: true,
            log_filter: "yombool=info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `path`, or `yombool.toml` when present, then apply environment
    /// overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `YOMBOOL_*` overrides read through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(output_dir) = lookup("YOMBOOL_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(output_dir);
        }

        if let Some(seed) = lookup("YOMBOOL_SEED") {
            self.color_seed = seed.parse().ok();
        }

        if let Some(bell) = lookup("YOMBOOL_BELL") {
            self.bell = bell.parse().unwrap_or(self.bell);
        }

        if let Some(filter) = lookup("YOMBOOL_LOG") {
            self.log_filter = filter;
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}
