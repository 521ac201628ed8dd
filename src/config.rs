//! Configuration loading and management.
//!
//! Discovery order (first found wins):
//! 1. An explicit path (`--config`)
//! 2. `./config-patch.yaml`
//! 3. `~/.config-patch/config.yaml`
//! 4. Built-in defaults
//!
//! Environment variables are applied on top of whichever was found:
//! - `CONFIG_PATCH_BASE` - Base configuration file
//! - `CONFIG_PATCH_FORMAT` - Output format (`yaml` or `json`)
//! - `CONFIG_PATCH_STRICT` - Exit non-zero on any failed record

use crate::format::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Project-level config file name.
pub const PROJECT_CONFIG_FILE: &str = "config-patch.yaml";

/// Tool configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base configuration the patches are applied to.
    #[serde(default)]
    pub base: Option<PathBuf>,

    /// Output format for the patched configuration.
    #[serde(default)]
    pub format: OutputFormat,

    /// Treat any failed record as a failed run.
    #[serde(default)]
    pub strict: bool,
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Load from an explicit path, or discover one, then apply environment overrides.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => match discover_config_file() {
                Some(path) => {
                    debug!(path = %path.display(), "using discovered config file");
                    Self::load(path)?
                }
                None => Self::default(),
            },
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `CONFIG_PATCH_*` overrides using the given variable lookup.
    pub fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(base) = var("CONFIG_PATCH_BASE") {
            self.base = Some(PathBuf::from(base));
        }

        if let Some(format) = var("CONFIG_PATCH_FORMAT") {
            match format.parse() {
                Ok(format) => self.format = format,
                Err(e) => warn!("ignoring CONFIG_PATCH_FORMAT: {}", e),
            }
        }

        if let Some(strict) = var("CONFIG_PATCH_STRICT") {
            match parse_bool(&strict) {
                Some(strict) => self.strict = strict,
                None => warn!(value = %strict, "ignoring CONFIG_PATCH_STRICT: not a boolean"),
            }
        }
    }
}

/// Find the first existing config file in the discovery order.
fn discover_config_file() -> Option<PathBuf> {
    let project = PathBuf::from(PROJECT_CONFIG_FILE);
    if project.exists() {
        return Some(project);
    }

    let user = dirs::home_dir()?.join(".config-patch").join("config.yaml");
    if user.exists() { Some(user) } else { None }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
