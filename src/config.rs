//! Loader Configuration Module
//!
//! Attribute conventions and identifier aliases for a [`ControlLoader`].
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`NODEBIND_APP_ATTRIBUTE`, `NODEBIND_CONTROL_ATTRIBUTE`,
//!    `NODEBIND_OPTION_PREFIX`, `NODEBIND_NAME_ATTRIBUTE`, `NODEBIND_MAX_EVENTS`)
//! 2. Config file (TOML)
//! 3. Defaults
//!
//! [`ControlLoader`]: crate::ControlLoader

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LoadError, Result};

pub const DEFAULT_APP_ATTRIBUTE: &str = "data-app";
pub const DEFAULT_CONTROL_ATTRIBUTE: &str = "data-control";
pub const DEFAULT_OPTION_PREFIX: &str = "data-";
pub const DEFAULT_NAME_ATTRIBUTE: &str = "data-name";
pub const DEFAULT_MAX_EVENTS: usize = 10_000;

/// Attribute conventions and aliases
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoaderConfig {
    /// Generic load attribute (bootstraps applications, marks load boundaries)
    pub app_attribute: String,

    /// Attribute marking nodes governed by a control
    pub control_attribute: String,

    /// Prefix of option attributes
    pub option_prefix: String,

    /// Attribute feeding the built-in `names` index
    pub name_attribute: String,

    /// Events retained by the loader's event log (0 = unbounded)
    pub max_events: usize,

    /// `@alias/...` → base path
    pub aliases: BTreeMap<String, String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            app_attribute: DEFAULT_APP_ATTRIBUTE.to_string(),
            control_attribute: DEFAULT_CONTROL_ATTRIBUTE.to_string(),
            option_prefix: DEFAULT_OPTION_PREFIX.to_string(),
            name_attribute: DEFAULT_NAME_ATTRIBUTE.to_string(),
            max_events: DEFAULT_MAX_EVENTS,
            aliases: BTreeMap::new(),
        }
    }
}

impl LoaderConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| LoadError::Config {
            reason: format!("Failed to parse config: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// Returns default config if the file doesn't exist.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| LoadError::Config {
            reason: format!("Failed to read config file {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// Merge with environment variables
    ///
    /// Environment variables take precedence over file values; empty ones are ignored.
    pub fn with_env(mut self) -> Self {
        let overrides = [
            ("NODEBIND_APP_ATTRIBUTE", &mut self.app_attribute),
            ("NODEBIND_CONTROL_ATTRIBUTE", &mut self.control_attribute),
            ("NODEBIND_OPTION_PREFIX", &mut self.option_prefix),
            ("NODEBIND_NAME_ATTRIBUTE", &mut self.name_attribute),
        ];
        for (var, field) in overrides {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    *field = value;
                }
            }
        }
        if let Some(max) = std::env::var("NODEBIND_MAX_EVENTS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.max_events = max;
        }
        self
    }

    pub fn alias(mut self, name: impl Into<String>, base: impl Into<String>) -> Self {
        self.aliases.insert(name.into(), base.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("app_attribute", &self.app_attribute),
            ("control_attribute", &self.control_attribute),
            ("option_prefix", &self.option_prefix),
            ("name_attribute", &self.name_attribute),
        ] {
            if value.is_empty() {
                return Err(LoadError::Config {
                    reason: format!("{field} must not be empty"),
                });
            }
        }
        if self.app_attribute == self.control_attribute {
            return Err(LoadError::Config {
                reason: format!(
                    "app_attribute and control_attribute are both '{}'",
                    self.app_attribute
                ),
            });
        }
        Ok(())
    }
}
