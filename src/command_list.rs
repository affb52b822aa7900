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

//! Loading of newline-delimited command files.
//!
//! One command per line. Surrounding whitespace is trimmed, blank lines and
//! lines starting with `#` are skipped, and everything else is kept verbatim
//! in file order. There is no quoting, escaping or line continuation.

use std::fmt;
use std::ops::Deref;
use std::path::Path;

use crate::error::ConfigError;

/// A single shell command: trimmed, non-empty and not a comment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command(String);

impl Command {
    /// Parse one line of a command file.
    ///
    /// Returns `None` for blank and comment lines.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            None
        } else {
            Some(Self(line.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Command {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered list of commands. Position is the identity of a command: the
/// same text may appear more than once and each occurrence is run and
/// reported separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandList {
    commands: Vec<Command>,
}

impl CommandList {
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    /// Parse command file contents already held in memory.
    pub fn parse(text: &str) -> Self {
        let commands = text
            .lines()
            .enumerate()
            .filter_map(|(line_idx, line)| {
                let command = Command::parse(line)?;
                tracing::debug!("Loaded command {}: {}", line_idx + 1, command);
                Some(command)
            })
            .collect();

        Self { commands }
    }

    /// Load a command file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::error!("Commands file not found: {}", path.display());
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::from_io(path, e))?;
        let list = Self::parse(&content);

        tracing::info!("Loaded {} commands from {}", list.len(), path.display());
        Ok(list)
    }

    pub fn as_slice(&self) -> &[Command] {
        &self.commands
    }
}

impl Deref for CommandList {
    type Target = [Command];

    fn deref(&self) -> &Self::Target {
        &self.commands
    }
}

impl FromIterator<Command> for CommandList {
    fn from_iter<I: IntoIterator<Item = Command>>(iter: I) -> Self {
        Self {
            commands: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for CommandList {
    type Item = Command;
    type IntoIter = std::vec::IntoIter<Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

impl<'a> IntoIterator for &'a CommandList {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}
