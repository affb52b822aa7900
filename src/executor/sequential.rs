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

//! Running a command list in order over one session.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::command_list::{Command, CommandList};
use crate::endpoint::Endpoint;
use crate::error::CommandExecutionError;
use crate::ssh::{Connector, Session, TransportOptions};

use super::aggregate::{aggregate, ChunkResults};
use super::reporter::{Reporter, TracingReporter};
use super::result_types::{CommandResult, ExecutionReport};

/// Default delay between two consecutive commands in sequential mode
pub const DEFAULT_PACING: Duration = Duration::from_millis(500);

/// Per-worker settings for [`run_commands`] and [`run_on_new_session`].
pub(crate) struct RunContext<'a> {
    pub reporter: &'a dyn Reporter,
    pub cancel: &'a CancellationToken,
    /// Delay between consecutive commands; zero disables pacing
    pub pacing: Duration,
    pub worker: usize,
    /// Length of the full command list
    pub total: usize,
}

/// Run `commands` one by one on `session`.
///
/// Every command yields a result. A command that cannot be run is recorded
/// with exit code `-1` and the loop moves on. After cancellation the
/// in-flight command and every remaining one are recorded as interrupted.
pub(crate) async fn run_commands<'c>(
    session: &mut Session,
    commands: impl IntoIterator<Item = (usize, &'c Command)>,
    ctx: &RunContext<'_>,
) -> ChunkResults {
    let mut results = ChunkResults::new();

    for (n, (position, command)) in commands.into_iter().enumerate() {
        if n > 0 && !ctx.pacing.is_zero() && !ctx.cancel.is_cancelled() {
            tokio::select! {
                _ = ctx.cancel.cancelled() => {}
                _ = tokio::time::sleep(ctx.pacing) => {}
            }
        }

        if ctx.cancel.is_cancelled() {
            results.push((
                position,
                CommandResult::failed(command.clone(), CommandExecutionError::Interrupted),
            ));
            continue;
        }

        ctx.reporter
            .command_started(ctx.worker, position, ctx.total, command);

        let outcome = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(CommandExecutionError::Interrupted),
            outcome = session.run(command) => outcome,
        };
        let result = outcome.unwrap_or_else(|e| CommandResult::failed(command.clone(), e));

        ctx.reporter
            .command_finished(ctx.worker, position, ctx.total, &result);
        results.push((position, result));
    }

    results
}

/// Open a fresh session, run `commands` on it, and close it.
///
/// If the session cannot be opened every command is recorded with exit
/// code `-1` and the connection diagnostic; the remote host is not
/// contacted again. The session is closed on every path, including when
/// the worker panics.
pub(crate) async fn run_on_new_session<'c>(
    endpoint: &Endpoint,
    connector: &dyn Connector,
    options: &TransportOptions,
    command_timeout: Option<Duration>,
    commands: Vec<(usize, &'c Command)>,
    ctx: &RunContext<'_>,
) -> ChunkResults {
    let mut session = Session::new(endpoint.clone()).with_command_timeout(command_timeout);

    let opened = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => None,
        opened = session.open(connector, options) => Some(opened),
    };

    let body = {
        let session = &mut session;
        async move {
            match opened {
                Some(Ok(())) => {
                    ctx.reporter.session_opened(ctx.worker, endpoint);
                    run_commands(session, commands, ctx).await
                }
                Some(Err(e)) => {
                    ctx.reporter.session_failed(ctx.worker, endpoint, &e);
                    let diagnostic =
                        format!("connection to {} failed: {}", endpoint.address(), e);
                    commands
                        .into_iter()
                        .map(|(position, command)| {
                            (position, CommandResult::failed(command.clone(), &diagnostic))
                        })
                        .collect()
                }
                None => commands
                    .into_iter()
                    .map(|(position, command)| {
                        (
                            position,
                            CommandResult::failed(
                                command.clone(),
                                CommandExecutionError::Interrupted,
                            ),
                        )
                    })
                    .collect(),
            }
        }
    };
    let outcome = AssertUnwindSafe(body).catch_unwind().await;

    let was_connected = session.is_connected();
    session.close().await;

    match outcome {
        Ok(results) => {
            if was_connected {
                ctx.reporter.session_closed(ctx.worker, endpoint);
            }
            results
        }
        Err(panic) => {
            // Session is already closed; let the caller see the panic.
            tracing::error!("Worker {} panicked, session to {} closed", ctx.worker, endpoint);
            std::panic::resume_unwind(panic)
        }
    }
}

/// Runs every command in order over a single session, pausing between
/// commands so the remote host is not flooded.
pub struct SequentialRunner {
    pacing: Duration,
    command_timeout: Option<Duration>,
    reporter: Arc<dyn Reporter>,
    cancel: CancellationToken,
}

impl Default for SequentialRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl SequentialRunner {
    pub fn new() -> Self {
        Self {
            pacing: DEFAULT_PACING,
            command_timeout: None,
            reporter: Arc::new(TracingReporter),
            cancel: CancellationToken::new(),
        }
    }

    /// Set the delay inserted between consecutive commands.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Set the per-command timeout for sessions opened by [`execute`](Self::execute).
    pub fn with_command_timeout(mut self, command_timeout: Option<Duration>) -> Self {
        self.command_timeout = command_timeout;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Stop early when `cancel` fires; unfinished commands are reported as interrupted.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn context(&self, total: usize) -> RunContext<'_> {
        RunContext {
            reporter: self.reporter.as_ref(),
            cancel: &self.cancel,
            pacing: self.pacing,
            worker: 0,
            total,
        }
    }

    /// Run `commands` on an already opened session.
    ///
    /// The session stays open; closing it is the caller's job.
    pub async fn run(&self, session: &mut Session, commands: &CommandList) -> ExecutionReport {
        let ctx = self.context(commands.len());
        let results = run_commands(session, commands.iter().enumerate(), &ctx).await;
        aggregate(commands, [results])
    }

    /// Open a session to `endpoint`, run `commands`, and close the session.
    pub async fn execute(
        &self,
        endpoint: &Endpoint,
        connector: &dyn Connector,
        options: &TransportOptions,
        commands: &CommandList,
    ) -> ExecutionReport {
        if commands.is_empty() {
            tracing::warn!("No commands to execute");
            return ExecutionReport::default();
        }

        let ctx = self.context(commands.len());
        let results = run_on_new_session(
            endpoint,
            connector,
            options,
            self.command_timeout,
            commands.iter().enumerate().collect(),
            &ctx,
        )
        .await;

        let report = aggregate(commands, [results]);
        tracing::info!(
            "Execution complete: {}/{} commands successful",
            report.success_count(),
            report.len()
        );
        report
    }
}
