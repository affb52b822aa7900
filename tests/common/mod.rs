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

//! Scripted transport and recording reporter shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use sshbatch::command_list::{Command, CommandList};
use sshbatch::endpoint::{Auth, Endpoint};
use sshbatch::error::{CommandExecutionError, ConnectionError};
use sshbatch::executor::{CommandResult, Reporter};
use sshbatch::ssh::{Connector, RemoteOutput, Transport, TransportOptions};

/// How the fake remote host answers one command.
#[derive(Debug, Clone)]
pub enum Reply {
    Exit {
        status: u32,
        stdout: String,
        stderr: String,
        delay: Duration,
    },
    Error(CommandExecutionError),
}

impl Reply {
    pub fn exit(status: u32) -> Self {
        Reply::Exit {
            status,
            stdout: String::new(),
            stderr: String::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_output(status: u32, stdout: &str, stderr: &str) -> Self {
        Reply::Exit {
            status,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(self, by: Duration) -> Self {
        match self {
            Reply::Exit {
                status,
                stdout,
                stderr,
                ..
            } => Reply::Exit {
                status,
                stdout,
                stderr,
                delay: by,
            },
            other => other,
        }
    }
}

/// One `exec` call seen by a fake transport.
#[derive(Debug, Clone)]
pub struct ExecCall {
    pub session: usize,
    pub command: String,
    pub at: Instant,
}

#[derive(Default)]
struct Recorded {
    open_attempts: usize,
    auths: Vec<Auth>,
    execs: Vec<ExecCall>,
    disconnects: Vec<usize>,
}

/// A [`Connector`] whose sessions answer from a script instead of a network.
///
/// Unscripted commands exit 0 and echo `out:<command>` on stdout.
#[derive(Clone, Default)]
pub struct MockConnector {
    replies: Arc<HashMap<String, Reply>>,
    failing_opens: Arc<HashMap<usize, ConnectionError>>,
    fail_every_open: Option<ConnectionError>,
    open_delay: Duration,
    recorded: Arc<Mutex<Recorded>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, command: &str, reply: Reply) -> Self {
        Arc::make_mut(&mut self.replies).insert(command.to_string(), reply);
        self
    }

    /// Make the `attempt`-th call to `connect` (zero-based) fail.
    pub fn fail_open(mut self, attempt: usize, error: ConnectionError) -> Self {
        Arc::make_mut(&mut self.failing_opens).insert(attempt, error);
        self
    }

    pub fn fail_every_open(mut self, error: ConnectionError) -> Self {
        self.fail_every_open = Some(error);
        self
    }

    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    pub fn open_attempts(&self) -> usize {
        self.recorded.lock().unwrap().open_attempts
    }

    pub fn auths(&self) -> Vec<Auth> {
        self.recorded.lock().unwrap().auths.clone()
    }

    pub fn exec_calls(&self) -> Vec<ExecCall> {
        self.recorded.lock().unwrap().execs.clone()
    }

    pub fn executed(&self) -> Vec<String> {
        self.exec_calls().into_iter().map(|c| c.command).collect()
    }

    /// Commands grouped by the session that ran them, in session order.
    pub fn executed_by_session(&self) -> Vec<Vec<String>> {
        let recorded = self.recorded.lock().unwrap();
        let mut by_session: Vec<Vec<String>> = vec![Vec::new(); recorded.open_attempts];
        for call in &recorded.execs {
            by_session[call.session].push(call.command.clone());
        }
        by_session
    }

    pub fn disconnects(&self) -> Vec<usize> {
        self.recorded.lock().unwrap().disconnects.clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(
        &self,
        _endpoint: &Endpoint,
        auth: Auth,
        _options: &TransportOptions,
    ) -> Result<Box<dyn Transport>, ConnectionError> {
        let attempt = {
            let mut recorded = self.recorded.lock().unwrap();
            let attempt = recorded.open_attempts;
            recorded.open_attempts += 1;
            recorded.auths.push(auth);
            attempt
        };

        if !self.open_delay.is_zero() {
            tokio::time::sleep(self.open_delay).await;
        }

        if let Some(error) = self
            .fail_every_open
            .clone()
            .or_else(|| self.failing_opens.get(&attempt).cloned())
        {
            return Err(error);
        }

        Ok(Box::new(MockTransport {
            session: attempt,
            replies: Arc::clone(&self.replies),
            recorded: Arc::clone(&self.recorded),
        }))
    }
}

struct MockTransport {
    session: usize,
    replies: Arc<HashMap<String, Reply>>,
    recorded: Arc<Mutex<Recorded>>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn exec(&mut self, command: &str) -> Result<RemoteOutput, CommandExecutionError> {
        self.recorded.lock().unwrap().execs.push(ExecCall {
            session: self.session,
            command: command.to_string(),
            at: Instant::now(),
        });

        match self.replies.get(command).cloned() {
            Some(Reply::Exit {
                status,
                stdout,
                stderr,
                delay,
            }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(RemoteOutput {
                    exit_status: status,
                    stdout: stdout.into_bytes(),
                    stderr: stderr.into_bytes(),
                })
            }
            Some(Reply::Error(e)) => Err(e),
            None => Ok(RemoteOutput {
                exit_status: 0,
                stdout: format!("out:{command}\n").into_bytes(),
                stderr: Vec::new(),
            }),
        }
    }

    async fn disconnect(&mut self) {
        self.recorded.lock().unwrap().disconnects.push(self.session);
    }
}

/// Progress event captured by [`RecordingReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Opened(usize),
    Failed(usize),
    Started(usize, usize),
    Finished(usize, usize, i32),
    Closed(usize),
}

#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Event>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Reporter for RecordingReporter {
    fn session_opened(&self, worker: usize, _endpoint: &Endpoint) {
        self.push(Event::Opened(worker));
    }

    fn session_failed(&self, worker: usize, _endpoint: &Endpoint, _error: &ConnectionError) {
        self.push(Event::Failed(worker));
    }

    fn command_started(&self, worker: usize, index: usize, _total: usize, _command: &Command) {
        self.push(Event::Started(worker, index));
    }

    fn command_finished(&self, worker: usize, index: usize, _total: usize, result: &CommandResult) {
        self.push(Event::Finished(worker, index, result.exit_code));
    }

    fn session_closed(&self, worker: usize, _endpoint: &Endpoint) {
        self.push(Event::Closed(worker));
    }
}

pub fn endpoint() -> Endpoint {
    Endpoint::new("192.0.2.10", 22, "deploy").with_password("secret")
}

pub fn commands(lines: &[&str]) -> CommandList {
    CommandList::parse(&lines.join("\n"))
}

pub fn numbered_commands(count: usize) -> CommandList {
    (1..=count)
        .map(|i| Command::parse(&format!("echo {i}")).unwrap())
        .collect()
}

pub fn command_texts(results: &[CommandResult]) -> Vec<String> {
    results.iter().map(|r| r.command.to_string()).collect()
}
