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

//! Terminal rendering of execution results.

use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::Mutex;

use crate::command_list::Command;
use crate::endpoint::Endpoint;
use crate::error::ConnectionError;
use crate::executor::{CommandResult, ExecutionReport, Reporter, TracingReporter};

const RULE_WIDTH: usize = 60;

/// Check if colors should be enabled
///
/// Colors are enabled when:
/// - stdout is a TTY
/// - NO_COLOR environment variable is not set
/// - TERM is not "dumb"
pub fn should_use_colors() -> bool {
    if !atty::is(atty::Stream::Stdout) {
        return false;
    }

    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }

    if let Ok(term) = std::env::var("TERM")
        && term == "dumb"
    {
        return false;
    }

    true
}

pub struct OutputFormatter;

impl OutputFormatter {
    pub fn format_header(destination: &str, command_count: usize, workers: usize) -> String {
        let mode = if workers > 1 {
            format!("{} parallel sessions", workers.to_string().bold())
        } else {
            "1 session".to_string()
        };

        format!(
            "{} {} {} on {} using {}\n{}",
            "►".cyan().bold(),
            "Executing".cyan(),
            pluralize(command_count, "command"),
            destination.bold(),
            mode,
            "─".repeat(RULE_WIDTH).dimmed()
        )
    }

    /// Render one result as a `[i/N] command` block. `index` is zero-based.
    pub fn format_command_output(index: usize, total: usize, result: &CommandResult) -> String {
        let mut output = String::new();

        let status_symbol = if result.is_success() {
            "✓".green().to_string()
        } else {
            "✗".red().to_string()
        };
        let position = format!("[{}/{}]", index + 1, total);

        output.push_str(&format!(
            "\n{} {} {}\n",
            status_symbol,
            position.dimmed(),
            result.command.as_str().bold()
        ));

        let exit_code = result.exit_code.to_string();
        if result.is_success() {
            output.push_str(&format!("Exit code: {}\n", exit_code.green()));
        } else {
            output.push_str(&format!("Exit code: {}\n", exit_code.red()));
        }

        let stdout = result.stdout_string();
        if !stdout.trim().is_empty() {
            output.push_str(&format!("{}\n", "STDOUT:".cyan()));
            output.push_str(&Self::format_output_box(&stdout, false));
        }

        let stderr = result.stderr_string();
        if !stderr.trim().is_empty() {
            output.push_str(&format!("{}\n", "STDERR:".yellow()));
            output.push_str(&Self::format_output_box(&stderr, true));
        }

        output
    }

    /// One line per finished command, for output that arrives out of order.
    pub fn format_progress_line(index: usize, total: usize, result: &CommandResult) -> String {
        let status_symbol = if result.is_success() {
            "✓".green().to_string()
        } else {
            "✗".red().to_string()
        };
        format!(
            "{} {} {} (exit {})\n",
            status_symbol,
            format!("[{}/{}]", index + 1, total).dimmed(),
            result.command,
            result.exit_code
        )
    }

    fn format_output_box(content: &str, is_error: bool) -> String {
        let mut output = String::new();
        for line in content.trim_end().lines() {
            if is_error {
                output.push_str(&format!("  {}\n", line.dimmed()));
            } else {
                output.push_str(&format!("  {line}\n"));
            }
        }
        output
    }

    pub fn format_summary(report: &ExecutionReport) -> String {
        let total = report.len();
        let success = report.success_count();
        let failed = total - success;

        let mut line = format!(
            "{}/{} commands successful",
            success.to_string().bold(),
            total
        );
        if failed > 0 {
            line.push_str(&format!(
                " • {} {}",
                failed.to_string().red().bold(),
                "failed".red()
            ));
        }

        let rule = "═".repeat(RULE_WIDTH);
        format!(
            "\n{}\n{}\n{}\n",
            rule.dimmed(),
            format!(" Summary: {line} ").bold(),
            rule.dimmed()
        )
    }

    pub fn format_report(report: &ExecutionReport) -> String {
        let total = report.len();
        let mut output: String = report
            .results()
            .iter()
            .enumerate()
            .map(|(index, result)| Self::format_command_output(index, total, result))
            .collect();
        output.push_str(&Self::format_summary(report));
        output
    }
}

/// Prints progress to the terminal while commands run.
///
/// With `full_output` every finished command is printed as a complete block,
/// which keeps file order when a single worker runs the list. Otherwise only
/// a one-line status is printed per command, since parallel workers finish
/// out of order. Events are also forwarded to [`TracingReporter`].
pub struct ConsoleReporter<W: Write + Send = io::Stdout> {
    out: Mutex<W>,
    full_output: bool,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout(full_output: bool) -> Self {
        Self::new(io::stdout(), full_output)
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W, full_output: bool) -> Self {
        Self {
            out: Mutex::new(out),
            full_output,
        }
    }

    fn emit(&self, text: &str) {
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            tracing::debug!("Failed to write progress: {}", e);
        }
    }
}

impl<W: Write + Send> Reporter for ConsoleReporter<W> {
    fn session_opened(&self, worker: usize, endpoint: &Endpoint) {
        TracingReporter.session_opened(worker, endpoint);
    }

    fn session_failed(&self, worker: usize, endpoint: &Endpoint, error: &ConnectionError) {
        TracingReporter.session_failed(worker, endpoint, error);
        self.emit(&format!(
            "{} Could not connect to {}: {}\n",
            "✗".red(),
            endpoint.to_string().bold(),
            error.to_string().red()
        ));
    }

    fn command_started(&self, worker: usize, index: usize, total: usize, command: &Command) {
        TracingReporter.command_started(worker, index, total, command);
    }

    fn command_finished(&self, worker: usize, index: usize, total: usize, result: &CommandResult) {
        TracingReporter.command_finished(worker, index, total, result);
        if self.full_output {
            self.emit(&OutputFormatter::format_command_output(index, total, result));
        } else {
            self.emit(&OutputFormatter::format_progress_line(index, total, result));
        }
    }

    fn session_closed(&self, worker: usize, endpoint: &Endpoint) {
        TracingReporter.session_closed(worker, endpoint);
    }
}

fn pluralize(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn result(command: &str, exit_code: i32, stdout: &str, stderr: &str) -> CommandResult {
        CommandResult {
            command: Command::parse(command).unwrap(),
            exit_code,
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_command_block_includes_streams() {
        let block =
            OutputFormatter::format_command_output(1, 3, &result("ls /tmp", 2, "a\nb\n", "oops"));
        assert!(block.contains("[2/3]"));
        assert!(block.contains("ls /tmp"));
        assert!(block.contains("STDOUT:"));
        assert!(block.contains("STDERR:"));
        assert!(block.contains("oops"));
        assert!(block.contains('2'));
    }

    #[test]
    fn test_command_block_omits_empty_streams() {
        let block = OutputFormatter::format_command_output(0, 1, &result("true", 0, "", "  \n"));
        assert!(!block.contains("STDOUT:"));
        assert!(!block.contains("STDERR:"));
    }

    #[test]
    fn test_report_lists_every_command_then_summary() {
        let report = ExecutionReport::new(vec![
            result("uptime", 0, "up 3 days", ""),
            result("false", 1, "", ""),
        ]);
        let rendered = OutputFormatter::format_report(&report);

        let first = rendered.find("uptime").unwrap();
        let second = rendered.find("false").unwrap();
        let summary = rendered.find("Summary").unwrap();
        assert!(first < second && second < summary);
        assert!(rendered.contains("commands successful"));
        assert!(rendered.contains("failed"));
    }

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_console_reporter_prints_each_finished_command() {
        let buffer = SharedBuffer::default();
        let reporter = ConsoleReporter::new(buffer.clone(), true);

        reporter.command_finished(0, 0, 2, &result("uptime", 0, "up 3 days", ""));
        let after_first = buffer.contents();
        assert!(after_first.contains("[1/2]"));
        assert!(after_first.contains("up 3 days"));

        reporter.command_finished(0, 1, 2, &result("false", 1, "", "boom"));
        let after_second = buffer.contents();
        assert!(after_second.starts_with(&after_first));
        assert!(after_second.contains("[2/2]"));
        assert!(after_second.contains("boom"));
    }

    #[test]
    fn test_console_reporter_progress_lines() {
        let buffer = SharedBuffer::default();
        let reporter = ConsoleReporter::new(buffer.clone(), false);

        reporter.command_finished(2, 4, 5, &result("df -h", 3, "lots of output", ""));
        let out = buffer.contents();
        assert!(out.contains("[5/5]"));
        assert!(out.contains("df -h"));
        assert!(out.contains("(exit 3)"));
        assert!(!out.contains("lots of output"));
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn test_console_reporter_reports_connection_failure() {
        let buffer = SharedBuffer::default();
        let reporter = ConsoleReporter::new(buffer.clone(), true);

        reporter.session_failed(
            0,
            &Endpoint::new("192.0.2.1", 22, "ops"),
            &ConnectionError::ConnectionUnreachable("no route to host".to_string()),
        );
        let out = buffer.contents();
        assert!(out.contains("ops@192.0.2.1:22"));
        assert!(out.contains("no route to host"));
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize(1, "command"), "1 command");
        assert_eq!(pluralize(0, "command"), "0 commands");
    }
}
