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

//! Progress reporting for runners.
//!
//! Runners receive a [`Reporter`] explicitly instead of writing to a global
//! logger, so callers (and tests) decide where progress goes.

use crate::command_list::Command;
use crate::endpoint::Endpoint;
use crate::error::ConnectionError;

use super::result_types::CommandResult;

/// Receives progress events from runners.
///
/// `worker` is the chunk index in parallel mode and `0` in sequential mode.
/// `index` is the command's position in the full command list and `total`
/// the length of that list. All methods default to no-ops.
pub trait Reporter: Send + Sync {
    fn session_opened(&self, _worker: usize, _endpoint: &Endpoint) {}

    fn session_failed(&self, _worker: usize, _endpoint: &Endpoint, _error: &ConnectionError) {}

    fn command_started(&self, _worker: usize, _index: usize, _total: usize, _command: &Command) {}

    fn command_finished(
        &self,
        _worker: usize,
        _index: usize,
        _total: usize,
        _result: &CommandResult,
    ) {
    }

    fn session_closed(&self, _worker: usize, _endpoint: &Endpoint) {}
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn session_opened(&self, worker: usize, endpoint: &Endpoint) {
        tracing::debug!(worker, "Session opened to {}", endpoint);
    }

    fn session_failed(&self, worker: usize, endpoint: &Endpoint, error: &ConnectionError) {
        tracing::error!(worker, "Could not open session to {}: {}", endpoint, error);
    }

    fn command_started(&self, worker: usize, index: usize, total: usize, command: &Command) {
        tracing::info!(worker, "Executing command {}/{}: {}", index + 1, total, command);
    }

    fn command_finished(&self, worker: usize, index: usize, total: usize, result: &CommandResult) {
        if result.is_success() {
            tracing::info!(
                worker,
                "Command {}/{} executed successfully (exit code: 0)",
                index + 1,
                total
            );
        } else if result.is_execution_failure() {
            tracing::error!(
                worker,
                "Command {}/{} could not be executed: {}",
                index + 1,
                total,
                result.stderr_string().trim_end()
            );
        } else {
            tracing::warn!(
                worker,
                "Command {}/{} failed with exit code: {}",
                index + 1,
                total,
                result.exit_code
            );
        }
    }

    fn session_closed(&self, worker: usize, endpoint: &Endpoint) {
        tracing::debug!(worker, "Session to {} closed", endpoint);
    }
}
