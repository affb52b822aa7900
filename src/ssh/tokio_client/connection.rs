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

//! SSH connection establishment and host key verification.

use russh::client::{Config, Handle, Handler};
use std::net::SocketAddr;
use std::sync::Arc;
use std::{fmt::Debug, io};

use super::authentication::{AuthMethod, ServerCheckMethod};

/// An authenticated ssh connection to a remote server.
///
/// Each [`execute`](Client::execute) call opens a fresh channel on the
/// same connection, so shell state does not carry over between commands.
pub struct Client {
    pub(super) connection_handle: Handle<ClientHandler>,
    pub(super) username: String,
    pub(super) address: SocketAddr,
}

impl Client {
    /// Resolve `host`, connect to the first address that accepts, and
    /// authenticate with `auth`.
    pub async fn connect_with_config(
        host: &str,
        port: u16,
        username: &str,
        auth: AuthMethod,
        server_check: ServerCheckMethod,
        config: Config,
    ) -> Result<Self, super::Error> {
        let config = Arc::new(config);

        let socket_addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
            .await
            .map_err(super::Error::AddressInvalid)?
            .collect();

        let mut connect_res = Err(super::Error::AddressInvalid(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("could not resolve {host}:{port} to any addresses"),
        )));
        for socket_addr in socket_addrs {
            let handler = ClientHandler::new(host.to_string(), socket_addr, server_check.clone());
            match russh::client::connect(config.clone(), socket_addr, handler).await {
                Ok(h) => {
                    connect_res = Ok((socket_addr, h));
                    break;
                }
                Err(e) => {
                    tracing::debug!("Connection attempt to {} failed: {}", socket_addr, e);
                    connect_res = Err(e);
                }
            }
        }
        let (address, mut handle) = connect_res?;

        super::authentication::authenticate(&mut handle, username, auth).await?;

        Ok(Self {
            connection_handle: handle,
            username: username.to_string(),
            address,
        })
    }

    pub fn get_connection_username(&self) -> &str {
        &self.username
    }

    pub fn get_connection_address(&self) -> &SocketAddr {
        &self.address
    }

    /// Disconnect from the remote host.
    pub async fn disconnect(&self) -> Result<(), super::Error> {
        self.connection_handle
            .disconnect(russh::Disconnect::ByApplication, "", "")
            .await
            .map_err(super::Error::SshError)
    }

    pub fn is_closed(&self) -> bool {
        self.connection_handle.is_closed()
    }
}

impl Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("username", &self.username)
            .field("address", &self.address)
            .field("connection_handle", &"Handle<ClientHandler>")
            .finish()
    }
}

/// SSH client handler for managing server key verification.
#[derive(Debug, Clone)]
pub struct ClientHandler {
    hostname: String,
    host: SocketAddr,
    server_check: ServerCheckMethod,
}

impl ClientHandler {
    pub fn new(hostname: String, host: SocketAddr, server_check: ServerCheckMethod) -> Self {
        Self {
            hostname,
            host,
            server_check,
        }
    }
}

impl Handler for ClientHandler {
    type Error = super::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &russh::keys::PublicKey,
    ) -> Result<bool, Self::Error> {
        match &self.server_check {
            ServerCheckMethod::NoCheck => Ok(true),
            ServerCheckMethod::RejectAll => Ok(false),
            ServerCheckMethod::KnownHostsFile(known_hosts_path) => {
                let result = russh::keys::check_known_hosts_path(
                    &self.hostname,
                    self.host.port(),
                    server_public_key,
                    known_hosts_path,
                )
                .map_err(|_| super::Error::ServerCheckFailed)?;

                Ok(result)
            }
            ServerCheckMethod::AcceptNew(known_hosts_path) => {
                // A changed key surfaces as Err and is rejected; only unknown hosts are learned.
                let known = russh::keys::check_known_hosts_path(
                    &self.hostname,
                    self.host.port(),
                    server_public_key,
                    known_hosts_path,
                )
                .map_err(|_| super::Error::ServerCheckFailed)?;

                if !known {
                    tracing::info!(
                        "Adding host key for {}:{} to {:?}",
                        self.hostname,
                        self.host.port(),
                        known_hosts_path
                    );
                    if let Err(e) = russh::keys::known_hosts::learn_known_hosts_path(
                        &self.hostname,
                        self.host.port(),
                        server_public_key,
                        known_hosts_path,
                    ) {
                        tracing::warn!("Failed to record host key: {}", e);
                    }
                }

                Ok(true)
            }
        }
    }
}
