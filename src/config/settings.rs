//! User-level configuration directory (`~/.safebox`).
//!
//! The directory is created on demand and may hold an optional
//! `config.yaml` overriding the built-in resource defaults:
//!
//! ```yaml
//! defaults:
//!   memory: 512m
//!   cpus: 2.0
//!   timeout: 120
//!   pids_limit: 128
//!   remove: true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Environment variable overriding the location of the safebox home.
pub const HOME_ENV_VAR: &str = "SAFEBOX_HOME";

const CONFIG_FILE: &str = "config.yaml";

/// Layout of the safebox home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeboxHome {
    root: PathBuf,
}

impl SafeboxHome {
    /// Uses `root` as the safebox home.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves the home from `SAFEBOX_HOME`, falling back to `~/.safebox`.
    ///
    /// Returns `None` when neither the override nor a user home directory
    /// can be determined.
    pub fn locate() -> Option<Self> {
        if let Some(dir) = std::env::var_os(HOME_ENV_VAR).filter(|v| !v.is_empty()) {
            return Some(Self::new(dir));
        }
        std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .filter(|v| !v.is_empty())
            .map(|home| Self::new(PathBuf::from(home).join(".safebox")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn profiles_dir(&self) -> PathBuf {
        self.root.join("profiles")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Creates the home, `profiles/` and `logs/` directories if missing.
    pub fn ensure_dirs(&self) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.root)?;
        fs::create_dir_all(self.profiles_dir())?;
        fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }

    /// Loads `config.yaml`, returning an empty config when the file is absent.
    pub fn load_config(&self) -> Result<UserConfig, ConfigError> {
        let path = self.config_path();
        if !path.is_file() {
            debug!(path = %path.display(), "No user config file");
            return Ok(UserConfig::default());
        }
        let content = fs::read_to_string(&path)?;
        UserConfig::from_yaml(&content).map_err(|e| ConfigError::ConfigFile {
            path,
            message: e.to_string(),
        })
    }
}

/// Contents of `config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    #[serde(default)]
    pub defaults: ResourceDefaults,
}

impl UserConfig {
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }
}

/// Resource defaults applied when the corresponding CLI flag is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceDefaults {
    pub memory: Option<String>,
    pub cpus: Option<f64>,
    pub timeout: Option<u64>,
    pub pids_limit: Option<i64>,
    pub remove: Option<bool>,
}
