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

//! Command execution over SSH session channels.

use super::connection::Client;

/// Buffer size for SSH command stdout
const SSH_CMD_BUFFER_SIZE: usize = 8192;

/// Buffer size for SSH command stderr
const SSH_RESPONSE_BUFFER_SIZE: usize = 1024;

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandExecutedResult {
    /// Raw stdout bytes of the command.
    pub stdout: Vec<u8>,
    /// Raw stderr bytes of the command.
    pub stderr: Vec<u8>,
    /// The unix exit status (`$?` in bash).
    pub exit_status: u32,
}

impl Client {
    /// Execute a remote command via the ssh connection.
    ///
    /// Blocks until the remote process exits and returns everything it wrote
    /// to stdout and stderr together with its exit status.
    ///
    /// Every invocation is a new shell context, so `cd`, variables and the
    /// like have no effect on later commands.
    pub async fn execute(&self, command: &str) -> Result<CommandExecutedResult, super::Error> {
        let mut stdout_buffer = Vec::with_capacity(SSH_CMD_BUFFER_SIZE);
        let mut stderr_buffer = Vec::with_capacity(SSH_RESPONSE_BUFFER_SIZE);
        let mut channel = self.connection_handle.channel_open_session().await?;
        channel.exec(true, command).await?;

        let mut result: Option<u32> = None;

        while let Some(msg) = channel.wait().await {
            match msg {
                russh::ChannelMsg::Data { ref data } => stdout_buffer.extend_from_slice(data),
                russh::ChannelMsg::ExtendedData { ref data, ext } => {
                    if ext == 1 {
                        stderr_buffer.extend_from_slice(data);
                    }
                }

                // The exit status may arrive before the last data packets, so
                // keep draining until the channel closes.
                russh::ChannelMsg::ExitStatus { exit_status } => result = Some(exit_status),

                russh::ChannelMsg::ExitSignal { signal_name, .. } => {
                    tracing::debug!("Remote command terminated by signal {:?}", signal_name);
                }

                // EOF may precede data or be omitted entirely (RFC 4254 5.3).
                _ => {}
            }
        }

        match result {
            Some(exit_status) => Ok(CommandExecutedResult {
                stdout: stdout_buffer,
                stderr: stderr_buffer,
                exit_status,
            }),
            None => Err(super::Error::CommandDidntExit),
        }
    }
}
