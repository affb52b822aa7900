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

//! The remote-session capability consumed by [`Session`](super::Session).
//!
//! The execution engine only ever talks to a [`Connector`] and the
//! [`Transport`] values it hands out. [`RusshConnector`](super::RusshConnector)
//! is the production implementation; tests substitute scripted ones.

use async_trait::async_trait;
use std::time::Duration;

use super::known_hosts::StrictHostKeyChecking;
use crate::endpoint::{Auth, Endpoint};
use crate::error::{CommandExecutionError, ConnectionError};

/// Default time allowed for TCP connect, key exchange and authentication
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport-level settings threaded from the caller to every session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Offer only the narrowed legacy key exchange and cipher lists
    pub legacy_algorithms: bool,
    pub strict_mode: StrictHostKeyChecking,
    /// `None` waits indefinitely
    pub connect_timeout: Option<Duration>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            legacy_algorithms: false,
            strict_mode: StrictHostKeyChecking::default(),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
        }
    }
}

impl TransportOptions {
    pub fn with_legacy_algorithms(mut self, legacy: bool) -> Self {
        self.legacy_algorithms = legacy;
        self
    }

    pub fn with_strict_mode(mut self, strict_mode: StrictHostKeyChecking) -> Self {
        self.strict_mode = strict_mode;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Option<Duration>) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

/// What a remote process produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteOutput {
    pub exit_status: u32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Opens authenticated connections.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        endpoint: &Endpoint,
        auth: Auth,
        options: &TransportOptions,
    ) -> Result<Box<dyn Transport>, ConnectionError>;
}

/// One live connection, exclusively owned by a single session.
#[async_trait]
pub trait Transport: Send {
    /// Run one command to completion.
    async fn exec(&mut self, command: &str) -> Result<RemoteOutput, CommandExecutionError>;

    /// Tear down the connection. Errors are logged, not returned.
    async fn disconnect(&mut self);
}
