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

//! Errors produced by the russh-backed client.

use std::io;
use thiserror::Error;

use crate::error::ConnectionError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Password authentication was rejected by the server")]
    PasswordWrong,

    #[error("Public key authentication was rejected by the server")]
    KeyAuthFailed,

    #[error("Unable to load private key: {0}")]
    KeyInvalid(#[source] russh::keys::Error),

    #[error("Unable to resolve address: {0}")]
    AddressInvalid(#[source] io::Error),

    #[error("Host key verification failed")]
    ServerCheckFailed,

    #[error("Remote command terminated without an exit status")]
    CommandDidntExit,

    #[error("SSH error: {0}")]
    SshError(#[from] russh::Error),
}

impl From<Error> for ConnectionError {
    fn from(err: Error) -> Self {
        let message = err.to_string();
        match err {
            Error::PasswordWrong | Error::KeyAuthFailed | Error::KeyInvalid(_) => {
                ConnectionError::AuthenticationFailed(message)
            }
            Error::AddressInvalid(_) | Error::SshError(russh::Error::IO(_)) => {
                ConnectionError::ConnectionUnreachable(message)
            }
            Error::ServerCheckFailed | Error::SshError(_) => {
                ConnectionError::ProtocolError(message)
            }
            Error::CommandDidntExit => ConnectionError::UnknownError(message),
        }
    }
}
