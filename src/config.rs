// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Optional YAML configuration file.
//!
//! Every field is optional and command-line flags take precedence. JSON is a
//! subset of YAML, so `config.json` files in the same shape load unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

use crate::error::ConfigError;

pub const DEFAULT_COMMANDS_FILE: &str = "commands.txt";

#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub hostname: Option<String>,
    pub username: Option<String>,
    pub password: Option<Zeroizing<String>>,
    pub key_filename: Option<String>,
    pub port: Option<u16>,
    pub commands_file: Option<String>,
    /// Split the command list across several sessions
    pub parallel: Option<bool>,
    pub workers: Option<usize>,
    pub legacy_algorithms: Option<bool>,
    /// Pause between commands in sequential mode, in milliseconds
    pub delay_ms: Option<u64>,
    /// Per-command timeout in seconds, 0 for none
    pub timeout: Option<u64>,
    pub connect_timeout: Option<u64>,
    pub strict_host_key_checking: Option<String>,
}

impl Config {
    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let expanded_path = expand_tilde(path);

        let content = std::fs::read_to_string(&expanded_path)
            .map_err(|e| ConfigError::from_io(&expanded_path, e))?;

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: expanded_path.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!("Loaded configuration from {:?}", expanded_path);
        Ok(config)
    }

    /// The skeleton written for users to fill in.
    pub fn template() -> Self {
        Self {
            hostname: Some(String::new()),
            username: Some(String::new()),
            password: Some(Zeroizing::new(String::new())),
            key_filename: Some(String::new()),
            port: Some(22),
            commands_file: Some(DEFAULT_COMMANDS_FILE.to_string()),
            parallel: Some(false),
            workers: Some(4),
            legacy_algorithms: Some(false),
            ..Self::default()
        }
    }

    /// Write [`Config::template`] to `path`, creating parent directories.
    pub fn write_template(path: &Path) -> Result<PathBuf, ConfigError> {
        let expanded_path = expand_tilde(path);

        let content = serde_yaml::to_string(&Self::template()).map_err(|e| ConfigError::Parse {
            path: expanded_path.clone(),
            reason: e.to_string(),
        })?;

        if let Some(parent) = expanded_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::from_io(parent, e))?;
        }
        std::fs::write(&expanded_path, content)
            .map_err(|e| ConfigError::from_io(&expanded_path, e))?;

        tracing::info!("Wrote configuration template to {:?}", expanded_path);
        Ok(expanded_path)
    }

    // Empty strings in the file mean "not set".

    pub fn hostname(&self) -> Option<&str> {
        non_empty(self.hostname.as_deref())
    }

    pub fn username(&self) -> Option<&str> {
        non_empty(self.username.as_deref())
    }

    pub fn password(&self) -> Option<&str> {
        non_empty(self.password.as_deref().map(String::as_str))
    }

    pub fn key_filename(&self) -> Option<PathBuf> {
        non_empty(self.key_filename.as_deref()).map(|p| expand_tilde(Path::new(p)))
    }

    pub fn commands_file(&self) -> Option<PathBuf> {
        non_empty(self.commands_file.as_deref()).map(|p| expand_tilde(Path::new(p)))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("key_filename", &self.key_filename)
            .field("port", &self.port)
            .field("commands_file", &self.commands_file)
            .field("parallel", &self.parallel)
            .field("workers", &self.workers)
            .field("legacy_algorithms", &self.legacy_algorithms)
            .field("delay_ms", &self.delay_ms)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("strict_host_key_checking", &self.strict_host_key_checking)
            .finish()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str()
        && let Some(rest) = path_str.strip_prefix("~/")
        && let Some(dirs) = directories::BaseDirs::new()
    {
        return dirs.home_dir().join(rest);
    }
    path.to_path_buf()
}
