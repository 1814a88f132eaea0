//! `.rulebook.toml` configuration.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, RuleError};
use crate::recommend::ScenarioContext;

pub const DEFAULT_CONFIG_FILE: &str = ".rulebook.toml";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Corpus root directory.
    pub root: PathBuf,
    /// Extra directory names skipped during discovery.
    pub exclude: Vec<String>,
    /// Extra discovery globs, on top of `rules.md` and `*-rules.md`.
    pub patterns: Vec<String>,
    /// Extra named scenarios added to the bundle catalog.
    pub bundles: BTreeMap<String, ScenarioContext>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            exclude: Vec::new(),
            patterns: Vec::new(),
            bundles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load from `path`. A missing file yields the defaults; a relative
    /// `root` is resolved against the config file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content).map_err(|source| RuleError::Config {
            path: path.to_path_buf(),
            source,
        })?;

        if config.root.is_relative() {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                config.root = dir.join(&config.root);
            }
        }
        Ok(config)
    }
}
