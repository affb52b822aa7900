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

//! Running a command list across a pool of workers, one session each.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::command_list::CommandList;
use crate::endpoint::Endpoint;
use crate::ssh::{Connector, TransportOptions};

use super::aggregate::{aggregate, ChunkResults};
use super::partition::partition;
use super::reporter::{Reporter, TracingReporter};
use super::result_types::ExecutionReport;
use super::sequential::{run_on_new_session, RunContext};

/// Parallel runner for executing one command list over several sessions.
///
/// The list is split into contiguous chunks and each chunk is handed to its
/// own tokio task. A task opens a private session, runs its chunk in order
/// without pacing, closes the session, and returns its results as a value.
/// Nothing is shared between tasks.
pub struct ParallelRunner {
    connector: Arc<dyn Connector>,
    options: TransportOptions,
    command_timeout: Option<Duration>,
    reporter: Arc<dyn Reporter>,
    cancel: CancellationToken,
}

impl ParallelRunner {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            options: TransportOptions::default(),
            command_timeout: None,
            reporter: Arc::new(TracingReporter),
            cancel: CancellationToken::new(),
        }
    }

    /// Set the transport options used by every worker's session.
    pub fn with_transport_options(mut self, options: TransportOptions) -> Self {
        self.options = options;
        self
    }

    /// Set command execution timeout.
    pub fn with_command_timeout(mut self, command_timeout: Option<Duration>) -> Self {
        self.command_timeout = command_timeout;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Stop early when `cancel` fires. Workers still close their sessions.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run `commands` on `endpoint` using up to `worker_count` sessions.
    ///
    /// Returns once every worker has finished. Results are in command list
    /// order regardless of which worker finished first.
    pub async fn run(
        &self,
        endpoint: &Endpoint,
        commands: &CommandList,
        worker_count: usize,
    ) -> ExecutionReport {
        if commands.is_empty() {
            tracing::warn!("No commands to execute");
            return ExecutionReport::default();
        }

        let chunks = partition(commands, worker_count);
        let total = commands.len();
        tracing::info!(
            "Executing {} commands on {} with {} worker(s)",
            total,
            endpoint,
            chunks.len()
        );

        let tasks: Vec<_> = chunks
            .into_iter()
            .map(|chunk| {
                let endpoint = endpoint.clone();
                let connector = Arc::clone(&self.connector);
                let options = self.options.clone();
                let command_timeout = self.command_timeout;
                let reporter = Arc::clone(&self.reporter);
                let cancel = self.cancel.clone();

                tokio::spawn(async move {
                    tracing::debug!(
                        "Worker {} handling commands {}..{}",
                        chunk.index,
                        chunk.offset + 1,
                        chunk.offset + chunk.len()
                    );

                    let ctx = RunContext {
                        reporter: reporter.as_ref(),
                        cancel: &cancel,
                        pacing: Duration::ZERO,
                        worker: chunk.index,
                        total,
                    };

                    run_on_new_session(
                        &endpoint,
                        connector.as_ref(),
                        &options,
                        command_timeout,
                        chunk.positions().collect(),
                        &ctx,
                    )
                    .await
                })
            })
            .collect();

        let results = join_all(tasks).await;
        let chunk_results: Vec<ChunkResults> = results
            .into_iter()
            .enumerate()
            .filter_map(|(worker, result)| match result {
                Ok(chunk_results) => Some(chunk_results),
                Err(e) => {
                    // Its commands are filled in as missing by the aggregator.
                    tracing::error!("Worker {} terminated abnormally: {}", worker, e);
                    None
                }
            })
            .collect();

        let report = aggregate(commands, chunk_results);
        tracing::info!(
            "Execution complete: {}/{} commands successful",
            report.success_count(),
            report.len()
        );
        report
    }
}
