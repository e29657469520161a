// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Store configuration.
//!
//! Read from YAML. `DIRSTORE_CONFIG` names the file; otherwise
//! `config.yaml` in the state directory is used when present. `DIRSTORE_HOME`
//! overrides the state directory.

use crate::error::{Error, Result};
use crate::registry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const HOME_ENV: &str = "DIRSTORE_HOME";
pub const CONFIG_ENV: &str = "DIRSTORE_CONFIG";
const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where the handle registry keeps its namespace documents
    pub state_dir: PathBuf,

    /// Namespace used when the caller does not name one
    pub default_namespace: Option<String>,

    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Delay between attempts while the registry backend is still opening
    pub retry_delay_ms: u64,

    /// Attempts before the backend is reported unavailable
    pub retry_limit: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            retry_delay_ms: policy.delay.as_millis() as u64,
            retry_limit: policy.max_retries,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            default_namespace: None,
            registry: RegistryConfig::default(),
        }
    }
}

fn default_state_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".dirstore"))
        .unwrap_or_else(|| PathBuf::from(".dirstore"))
}

impl Config {
    /// Load using the environment variables described in the module docs.
    pub fn load() -> Result<Self> {
        let home = std::env::var_os(HOME_ENV).map(PathBuf::from);
        let file = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::load_from(file.as_deref(), home)
    }

    /// Load `file` (or `<state dir>/config.yaml` when `None`), then apply the
    /// `home` override. A missing default file yields defaults; a missing
    /// explicit file is an error.
    pub fn load_from(file: Option<&Path>, home: Option<PathBuf>) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::read(path)?,
            None => {
                let dir = home.clone().unwrap_or_else(default_state_dir);
                let path = dir.join(CONFIG_FILE);
                if path.exists() {
                    Self::read(&path)?
                } else {
                    Self::default()
                }
            }
        };

        if let Some(home) = home {
            config.state_dir = home;
        }
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Config =
            serde_yaml_ng::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&text)
    }

    fn validate(&self) -> Result<()> {
        if self.state_dir.as_os_str().is_empty() {
            return Err(Error::Config("state_dir must not be empty".into()));
        }
        if self.registry.retry_delay_ms == 0 {
            return Err(Error::Config("registry.retry_delay_ms must be positive".into()));
        }
        Ok(())
    }

    #[must_use]
    pub fn registry_dir(&self) -> PathBuf {
        self.state_dir.join("registry")
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            delay: Duration::from_millis(self.registry.retry_delay_ms),
            max_retries: self.registry.retry_limit,
        }
    }
}
