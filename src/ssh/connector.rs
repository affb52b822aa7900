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

//! [`Connector`] backed by the russh client.

use async_trait::async_trait;

use super::known_hosts;
use super::tokio_client::{algorithms, AuthMethod, Client, Config, Error};
use super::transport::{Connector, RemoteOutput, Transport, TransportOptions};
use crate::endpoint::{Auth, Endpoint};
use crate::error::{CommandExecutionError, ConnectionError};

#[derive(Debug, Default, Clone, Copy)]
pub struct RusshConnector;

impl RusshConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for RusshConnector {
    async fn connect(
        &self,
        endpoint: &Endpoint,
        auth: Auth,
        options: &TransportOptions,
    ) -> Result<Box<dyn Transport>, ConnectionError> {
        let auth_method = match auth {
            Auth::Password(password) => AuthMethod::Password(password),
            Auth::KeyFile(path) => AuthMethod::with_key_file(path, None),
        };

        let config = Config {
            preferred: algorithms::preferred(options.legacy_algorithms),
            ..Default::default()
        };
        if options.legacy_algorithms {
            tracing::debug!("Offering legacy key exchange and cipher algorithms to {}", endpoint);
        }

        let check_method = known_hosts::get_check_method(options.strict_mode);
        let connect = Client::connect_with_config(
            &endpoint.host,
            endpoint.port,
            &endpoint.username,
            auth_method,
            check_method,
            config,
        );

        let client = match options.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, connect).await.map_err(|_| {
                ConnectionError::ConnectionUnreachable(format!(
                    "timed out after {}s connecting to {}",
                    limit.as_secs(),
                    endpoint.address()
                ))
            })?,
            None => connect.await,
        }
        .map_err(ConnectionError::from)?;

        tracing::debug!(
            "Authenticated as {} on {}",
            client.get_connection_username(),
            client.get_connection_address()
        );

        Ok(Box::new(RusshTransport { client }))
    }
}

struct RusshTransport {
    client: Client,
}

#[async_trait]
impl Transport for RusshTransport {
    async fn exec(&mut self, command: &str) -> Result<RemoteOutput, CommandExecutionError> {
        if self.client.is_closed() {
            return Err(CommandExecutionError::Transport(
                "connection closed by remote host".to_string(),
            ));
        }

        match self.client.execute(command).await {
            Ok(result) => Ok(RemoteOutput {
                exit_status: result.exit_status,
                stdout: result.stdout,
                stderr: result.stderr,
            }),
            Err(Error::CommandDidntExit) => Err(CommandExecutionError::NoExitStatus),
            Err(e) => Err(CommandExecutionError::Transport(e.to_string())),
        }
    }

    async fn disconnect(&mut self) {
        if self.client.is_closed() {
            return;
        }
        if let Err(e) = self.client.disconnect().await {
            tracing::debug!("Error while disconnecting: {}", e);
        }
    }
}
