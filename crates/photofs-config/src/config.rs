// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Result;

#[cfg(test)]
#[path = "./config_test.rs"]
mod config_test;

/// Environment variables with this prefix override configuration values,
/// eg: `PHOTOFS_STORAGE_ROOT` sets `storage.root`.
pub const ENV_PREFIX: &str = "PHOTOFS_";

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Storage {
    /// Holds the database, lock and write counter files.
    pub root: PathBuf,
}

impl Default for Storage {
    fn default() -> Self {
        let root = dirs::data_dir()
            .map(|dir| dir.join("photofs"))
            .unwrap_or_else(|| PathBuf::from(".photofs"));
        Self { root }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Source {
    /// The directory of photos that is mirrored into the filesystem.
    pub root: PathBuf,
}

impl Default for Source {
    fn default() -> Self {
        let root = dirs::picture_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Pictures")))
            .unwrap_or_else(|| PathBuf::from("."));
        Self { root }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Mount {
    /// How many of the latest tag applications are considered
    /// when listing recently used tags.
    pub recent_tags: usize,
}

impl Default for Mount {
    fn default() -> Self {
        Self { recent_tags: 10 }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Lock {
    pub timeout_ms: u64,
}

impl Default for Lock {
    fn default() -> Self {
        Self { timeout_ms: 1000 }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    // These sub-types should only have one level of values within
    // them, otherwise they cannot be addressed with environment variables.
    pub storage: Storage,
    pub source: Source,
    pub mount: Mount,
    pub lock: Lock,
}

impl Config {
    /// Load the configuration from the standard locations
    /// and the current environment.
    pub fn load() -> Result<Self> {
        load_config()
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock.timeout_ms)
    }
}

/// Load the configuration from the standard locations and
/// the current environment.
pub fn load_config() -> Result<Config> {
    load_config_with(None, std::env::vars())
}

/// Load the configuration from the standard locations, then the given
/// file (if any), and finally the given environment variables.
pub fn load_config_with<I>(file: Option<&Path>, vars: I) -> Result<Config>
where
    I: IntoIterator<Item = (String, String)>,
{
    use config::{Config as RawConfig, File};

    let mut config_builder = RawConfig::builder()
        // the system config can be in any supported format: toml, yaml, json, ini, etc
        .add_source(File::with_name("/etc/photofs").required(false));
    if let Some(user_config_dir) = dirs::config_dir() {
        let user_config = user_config_dir.join("photofs").join("photofs");
        config_builder = config_builder
            .add_source(File::with_name(&format!("{}", user_config.display())).required(false));
    }
    if let Some(file) = file {
        if let Err(err) = std::fs::metadata(file) {
            return Err(crate::Error::InvalidPath(file.to_owned(), err));
        }
        config_builder = config_builder.add_source(File::from(file).required(true));
    }

    for (var, value) in vars {
        let Some(tail) = var.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let Some((section, name)) = tail.split_once('_') else {
            // a value with no section is not a configuration
            // value, and can be skipped (eg: PHOTOFS_LOG)
            continue;
        };

        let key = format!("{}.{}", section.to_lowercase(), name.to_lowercase());
        config_builder = config_builder.set_override(key, value)?;
    }

    let config = config_builder.build()?;
    Ok(Config::deserialize(config)?)
}
