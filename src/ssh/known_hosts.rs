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

use super::tokio_client::ServerCheckMethod;
use directories::BaseDirs;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Get the default known_hosts file path
pub fn get_default_known_hosts_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(".ssh").join("known_hosts"))
}

/// Create a ServerCheckMethod based on strict host key checking mode
pub fn get_check_method(strict_mode: StrictHostKeyChecking) -> ServerCheckMethod {
    match strict_mode {
        StrictHostKeyChecking::Yes => match get_default_known_hosts_path() {
            Some(path) if path.exists() => {
                tracing::debug!("Using known_hosts file: {:?} (strict mode)", path);
                ServerCheckMethod::KnownHostsFile(path)
            }
            Some(path) => {
                // Nothing can be verified against a missing file; every host is rejected.
                tracing::warn!(
                    "Known hosts file not found at {:?}, all host keys will be rejected",
                    path
                );
                ServerCheckMethod::KnownHostsFile(path)
            }
            None => {
                tracing::warn!("Could not determine known_hosts path, rejecting host keys");
                ServerCheckMethod::RejectAll
            }
        },
        StrictHostKeyChecking::No => {
            tracing::debug!("Host key checking disabled (strict mode = no)");
            ServerCheckMethod::NoCheck
        }
        StrictHostKeyChecking::AcceptNew => match get_default_known_hosts_path() {
            Some(path) => {
                if let Some(ssh_dir) = path.parent() {
                    if let Err(e) = std::fs::create_dir_all(ssh_dir) {
                        tracing::debug!("Could not create {:?}: {}", ssh_dir, e);
                    }
                }
                tracing::debug!("Using known_hosts file: {:?} (accept-new mode)", path);
                ServerCheckMethod::AcceptNew(path)
            }
            None => {
                tracing::warn!("Could not determine known_hosts path, using NoCheck");
                ServerCheckMethod::NoCheck
            }
        },
    }
}

/// Mode for host key checking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrictHostKeyChecking {
    /// Always verify host keys (fail on unknown/changed)
    Yes,
    /// Never verify host keys (accept all)
    No,
    /// Verify known hosts, add new ones automatically (TOFU)
    #[default]
    AcceptNew,
}

impl FromStr for StrictHostKeyChecking {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yes" | "true" => Ok(Self::Yes),
            "no" | "false" => Ok(Self::No),
            "accept-new" | "tofu" => Ok(Self::AcceptNew),
            other => Err(format!(
                "invalid host key checking mode '{other}' (expected yes, no or accept-new)"
            )),
        }
    }
}

impl fmt::Display for StrictHostKeyChecking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::AcceptNew => "accept-new",
        })
    }
}
