//! Configuration management with environment variable support.
//!
//! This module provides [`Config`] for loading and validating VaultFS
//! settings from JSON files and environment variables.
//!
//! ## Environment Variables
//!
//! - `VAULTFS_PASSWORD_PATH`: Override password file path
//! - `VAULTFS_MAX_DEPTH`: Override tree-walk depth ceiling
//! - `VAULTFS_CONFIG`: Override config file path

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Environment variable names for configuration overrides
pub const ENV_PASSWORD_PATH: &str = "VAULTFS_PASSWORD_PATH";
pub const ENV_MAX_DEPTH: &str = "VAULTFS_MAX_DEPTH";
pub const ENV_CONFIG_PATH: &str = "VAULTFS_CONFIG";

fn default_max_depth() -> usize {
    crate::tree::DEFAULT_MAX_DEPTH
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub password_path: String,
    /// Ceiling on directory nesting during tree removal
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            password_path: "./.vaultfs_pass".to_string(),
            max_depth: default_max_depth(),
        }
    }
}

impl Config {
    /// Load config from file path
    pub fn load(path: &str) -> Result<Self> {
        let s =
            fs::read_to_string(path).with_context(|| format!("reading config file {}", path))?;
        let mut config: Config = serde_json::from_str(&s)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load config with environment variable overrides
    /// Priority: ENV vars > config file > defaults
    pub fn load_with_env(path: Option<&str>) -> Result<Self> {
        // Check for config path from environment
        let config_path = path
            .map(String::from)
            .or_else(|| env::var(ENV_CONFIG_PATH).ok());

        let mut config = match config_path {
            Some(ref p) if Path::new(p).exists() => {
                info!(path = p, "loading config from file");
                let s = fs::read_to_string(p)
                    .with_context(|| format!("reading config file {}", p))?;
                serde_json::from_str(&s)?
            }
            _ => {
                debug!("using default configuration");
                Config::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to config
    fn apply_env_overrides(&mut self) {
        if let Ok(password_path) = env::var(ENV_PASSWORD_PATH) {
            debug!(password_path = %password_path, "overriding password_path from environment");
            self.password_path = password_path;
        }

        if let Ok(max_depth) = env::var(ENV_MAX_DEPTH) {
            match max_depth.parse::<usize>() {
                Ok(depth) => {
                    debug!(max_depth = depth, "overriding max_depth from environment");
                    self.max_depth = depth;
                }
                Err(_) => warn!(value = %max_depth, "ignoring non-numeric {}", ENV_MAX_DEPTH),
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.password_path.trim().is_empty() {
            anyhow::bail!("password_path cannot be empty");
        }

        if self.max_depth == 0 {
            anyhow::bail!("max_depth must be at least 1");
        }

        // Warn if the password path looks like it might be in a public directory
        let password_path = Path::new(&self.password_path);
        if let Some(parent) = password_path.parent() {
            let parent_str = parent.to_string_lossy().to_lowercase();
            if parent_str.contains("public")
                || parent_str.contains("www")
                || parent_str.contains("htdocs")
            {
                warn!(
                    path = %self.password_path,
                    "password file path appears to be in a public directory - this is a security risk"
                );
            }
        }

        if self.password_path.contains("..") {
            warn!("password_path contains '..' - consider using absolute paths");
        }

        Ok(())
    }

    /// Create a new config with explicit values
    pub fn new(password_path: impl Into<String>) -> Self {
        Self {
            password_path: password_path.into(),
            ..Self::default()
        }
    }
}
