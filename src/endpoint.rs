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

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

pub const DEFAULT_SSH_PORT: u16 = 22;

/// The authentication method actually used for one connection attempt.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    Password(Zeroizing<String>),
    KeyFile(PathBuf),
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::Password(_) => f.write_str("Password(***)"),
            Auth::KeyFile(path) => f.debug_tuple("KeyFile").field(path).finish(),
        }
    }
}

/// Credentials configured for an endpoint.
///
/// Both may be present; [`Credentials::resolve`] picks the key file when it
/// exists on disk and falls back to the password otherwise.
#[derive(Clone, Default)]
pub struct Credentials {
    pub key_path: Option<PathBuf>,
    pub password: Option<Zeroizing<String>>,
}

impl Credentials {
    pub fn resolve(&self) -> Option<Auth> {
        if let Some(key_path) = self.key_path.as_deref() {
            if key_path.exists() {
                return Some(Auth::KeyFile(key_path.to_path_buf()));
            }
            tracing::debug!(
                "Key file {:?} does not exist, falling back to password authentication",
                key_path
            );
        }

        self.password.clone().map(Auth::Password)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key_path", &self.key_path)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// A remote host to run commands on.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub credentials: Credentials,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            credentials: Credentials::default(),
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.credentials.password = Some(Zeroizing::new(password.into()));
        self
    }

    pub fn with_key_file(mut self, key_path: impl AsRef<Path>) -> Self {
        self.credentials.key_path = Some(key_path.as_ref().to_path_buf());
        self
    }

    /// Parse a `[user@]host[:port]` destination.
    pub fn parse(destination: &str, default_user: Option<&str>) -> Result<Self> {
        let (user_part, host_part) = match destination.split_once('@') {
            Some((user, rest)) => (Some(user), rest),
            None => (None, destination),
        };

        let (host, port) = if let Some(rest) = host_part.strip_prefix('[') {
            // [ipv6]:port
            let (host, after) = rest
                .split_once(']')
                .context("Unclosed '[' in IPv6 destination")?;
            let port = match after.strip_prefix(':') {
                Some(port_str) => port_str.parse::<u16>().context("Invalid port number")?,
                None => DEFAULT_SSH_PORT,
            };
            (host, port)
        } else if host_part.matches(':').count() > 1 {
            anyhow::bail!(
                "Destination '{destination}' looks like an IPv6 address; write it as [addr] or [addr]:port"
            );
        } else if let Some((host, port_str)) = host_part.split_once(':') {
            let port = port_str.parse::<u16>().context("Invalid port number")?;
            (host, port)
        } else {
            (host_part, DEFAULT_SSH_PORT)
        };

        if host.is_empty() {
            anyhow::bail!("Destination '{destination}' has an empty host");
        }

        let username = user_part
            .filter(|u| !u.is_empty())
            .or(default_user)
            .map(|s| s.to_string())
            .unwrap_or_else(|| {
                std::env::var("USER")
                    .or_else(|_| std::env::var("USERNAME"))
                    .unwrap_or_else(|_| "root".to_string())
            });

        Ok(Self::new(host, port, username))
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.username, self.host, self.port)
    }
}
