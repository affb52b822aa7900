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

//! A single authenticated session to one endpoint.
//!
//! ```text
//! Disconnected --open--> Connecting --ok--> Connected --close--> Closed
//!       ^                    |
//!       +------- error ------+
//! ```
//!
//! A session is owned by exactly one runner. `close` is idempotent and valid
//! from every state.

use std::fmt;
use std::time::Duration;

use super::transport::{Connector, Transport, TransportOptions};
use crate::command_list::Command;
use crate::endpoint::Endpoint;
use crate::error::{CommandExecutionError, ConnectionError};
use crate::executor::CommandResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closed => "closed",
        })
    }
}

pub struct Session {
    endpoint: Endpoint,
    state: SessionState,
    transport: Option<Box<dyn Transport>>,
    command_timeout: Option<Duration>,
}

impl Session {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            state: SessionState::Disconnected,
            transport: None,
            command_timeout: None,
        }
    }

    /// Abort any single command that runs longer than `timeout`.
    pub fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Create a session and open it in one step.
    pub async fn connect(
        endpoint: Endpoint,
        connector: &dyn Connector,
        options: &TransportOptions,
    ) -> Result<Self, ConnectionError> {
        let mut session = Self::new(endpoint);
        session.open(connector, options).await?;
        Ok(session)
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    /// Authenticate and connect.
    ///
    /// The key file is used when one is configured and exists on disk,
    /// otherwise the password. Failures are returned as-is and never retried.
    pub async fn open(
        &mut self,
        connector: &dyn Connector,
        options: &TransportOptions,
    ) -> Result<(), ConnectionError> {
        match self.state {
            SessionState::Connected => return Ok(()),
            SessionState::Closed => {
                return Err(ConnectionError::UnknownError(
                    "session has already been closed".to_string(),
                ))
            }
            SessionState::Disconnected | SessionState::Connecting => {}
        }

        let Some(auth) = self.endpoint.credentials.resolve() else {
            tracing::error!("No authentication method provided (password or key)");
            return Err(ConnectionError::AuthenticationFailed(
                "no authentication method provided (password or key)".to_string(),
            ));
        };

        tracing::info!("Connecting to {}", self.endpoint);
        self.state = SessionState::Connecting;

        match connector.connect(&self.endpoint, auth, options).await {
            Ok(transport) => {
                self.transport = Some(transport);
                self.state = SessionState::Connected;
                tracing::info!("SSH connection to {} established", self.endpoint.address());
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Disconnected;
                tracing::error!("Failed to connect to {}: {}", self.endpoint.address(), e);
                Err(e)
            }
        }
    }

    /// Run one command and wait for it to finish.
    ///
    /// Fails with [`CommandExecutionError::NotConnected`] without touching the
    /// network unless the session is `Connected`. A non-zero remote exit
    /// status is a successful `run` whose result carries that status.
    pub async fn run(&mut self, command: &Command) -> Result<CommandResult, CommandExecutionError> {
        let transport = match (self.state, self.transport.as_mut()) {
            (SessionState::Connected, Some(transport)) => transport,
            _ => return Err(CommandExecutionError::NotConnected),
        };

        tracing::debug!("Executing command on {}: {}", self.endpoint.address(), command);

        let output = match self.command_timeout {
            Some(limit) => tokio::time::timeout(limit, transport.exec(command.as_str()))
                .await
                .map_err(|_| CommandExecutionError::TimedOut(limit))??,
            None => transport.exec(command.as_str()).await?,
        };

        Ok(CommandResult::from_output(command.clone(), output))
    }

    /// Close the session. Safe to call repeatedly and from any state.
    pub async fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.disconnect().await;
            tracing::info!("SSH connection to {} closed", self.endpoint.address());
        }
        self.state = SessionState::Closed;
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state)
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.transport.is_some() {
            tracing::debug!(
                "Session to {} dropped while {}; connection torn down without a clean disconnect",
                self.endpoint.address(),
                self.state
            );
        }
    }
}
