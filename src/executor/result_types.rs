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

//! Per-command results and the final ordered report.

use std::fmt;

use crate::command_list::Command;
use crate::ssh::RemoteOutput;

/// Exit code recorded when the execution attempt itself failed, as opposed
/// to a remote process exiting with a status.
pub const FAILED_EXIT_CODE: i32 = -1;

/// Outcome of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub command: Command,
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandResult {
    pub fn from_output(command: Command, output: RemoteOutput) -> Self {
        Self {
            command,
            exit_code: i32::try_from(output.exit_status).unwrap_or(i32::MAX),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }

    /// A result for a command that could not be run at all. The diagnostic
    /// goes to stderr.
    pub fn failed(command: Command, diagnostic: impl fmt::Display) -> Self {
        Self {
            command,
            exit_code: FAILED_EXIT_CODE,
            stdout: Vec::new(),
            stderr: diagnostic.to_string().into_bytes(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// True when no remote exit status exists for this command.
    pub fn is_execution_failure(&self) -> bool {
        self.exit_code == FAILED_EXIT_CODE
    }

    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}

/// Results for a whole command list, in command list order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    results: Vec<CommandResult>,
}

impl ExecutionReport {
    pub fn new(results: Vec<CommandResult>) -> Self {
        Self { results }
    }

    pub fn results(&self) -> &[CommandResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CommandResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    /// True when every command exited with status 0.
    ///
    /// An empty report is not a success: nothing was executed, so there is
    /// nothing to vouch for.
    pub fn all_succeeded(&self) -> bool {
        !self.results.is_empty() && self.success_count() == self.results.len()
    }
}
