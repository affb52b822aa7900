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

//! Error taxonomy for the execution engine.
//!
//! # Error Categories
//!
//! - [`ConfigError`]: the command file or configuration could not be loaded.
//!   Fatal, raised before any session is opened.
//! - [`ConnectionError`]: a session could not be established. Fatal for that
//!   session only; in parallel mode it fails only the affected chunk.
//! - [`CommandExecutionError`]: a single command could not be dispatched or
//!   its result could not be retrieved. Recorded as exit code `-1` and the
//!   runner moves on to the next command.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while loading the command list or configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file does not exist
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The file exists but could not be read
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file was read but its contents are malformed
    #[error("failed to parse '{}': {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// The merged settings are incomplete or contradictory
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Build the appropriate variant for an I/O failure on `path`.
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io { path, source }
        }
    }
}

/// Errors raised while opening a session.
///
/// None of these are retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectionError {
    /// The server rejected the credentials, or no usable credentials were supplied
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The host could not be resolved or reached
    #[error("connection unreachable: {0}")]
    ConnectionUnreachable(String),

    /// Key exchange, host key verification, or another protocol step failed
    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("unknown connection error: {0}")]
    UnknownError(String),
}

/// Errors raised while running one command on an open session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandExecutionError {
    /// The session is not in the `Connected` state
    #[error("session is not connected")]
    NotConnected,

    /// The transport failed to dispatch the command or collect its output
    #[error("transport failure: {0}")]
    Transport(String),

    /// The remote process ended without reporting an exit status
    #[error("remote command terminated without an exit status")]
    NoExitStatus,

    #[error("command did not complete within {}s", .0.as_secs())]
    TimedOut(Duration),

    /// The run was cancelled before this command finished
    #[error("interrupted before the command completed")]
    Interrupted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_maps_not_found() {
        let err = ConfigError::from_io(
            "/missing/commands.txt",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, ConfigError::NotFound { .. }));
        assert!(err.to_string().contains("/missing/commands.txt"));
    }

    #[test]
    fn test_from_io_keeps_other_kinds() {
        let err = ConfigError::from_io(
            "commands.txt",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_timeout_message_mentions_seconds() {
        let err = CommandExecutionError::TimedOut(Duration::from_secs(30));
        assert_eq!(err.to_string(), "command did not complete within 30s");
    }
}
