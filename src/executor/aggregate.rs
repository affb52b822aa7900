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

//! Merging worker results back into command list order.

use crate::command_list::CommandList;

use super::result_types::{CommandResult, ExecutionReport};

/// Results produced by one worker, keyed by position in the full command list.
pub type ChunkResults = Vec<(usize, CommandResult)>;

pub(crate) const MISSING_RESULT: &str = "missing result: no worker reported this command";

/// Re-emit results in exactly the order of `original_order`.
///
/// Results are matched by position, never by command text, so repeated
/// commands keep their own results. A position without a result, or whose
/// result belongs to a different command, gets a `-1` placeholder.
pub fn aggregate<I>(original_order: &CommandList, chunk_results: I) -> ExecutionReport
where
    I: IntoIterator<Item = ChunkResults>,
{
    let mut slots: Vec<Option<CommandResult>> = vec![None; original_order.len()];

    for (position, result) in chunk_results.into_iter().flatten() {
        let Some(expected) = original_order.get(position) else {
            tracing::warn!(
                "Discarding result for position {} outside a list of {} commands",
                position,
                original_order.len()
            );
            continue;
        };

        if result.command != *expected {
            tracing::warn!(
                "Discarding result for '{}' reported at position {} which holds '{}'",
                result.command,
                position,
                expected
            );
            continue;
        }

        let slot = &mut slots[position];
        if slot.is_some() {
            tracing::warn!("Duplicate result for position {}, keeping the first", position);
            continue;
        }
        *slot = Some(result);
    }

    let results = slots
        .into_iter()
        .zip(original_order.iter())
        .enumerate()
        .map(|(position, (slot, command))| {
            slot.unwrap_or_else(|| {
                tracing::error!("No result for command {}: {}", position + 1, command);
                CommandResult::failed(command.clone(), MISSING_RESULT)
            })
        })
        .collect();

    ExecutionReport::new(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_list::Command;
    use crate::executor::result_types::FAILED_EXIT_CODE;

    fn commands(texts: &[&str]) -> CommandList {
        texts.iter().map(|t| Command::parse(t).unwrap()).collect()
    }

    fn ok(list: &CommandList, position: usize, stdout: &str) -> (usize, CommandResult) {
        (
            position,
            CommandResult {
                command: list[position].clone(),
                exit_code: 0,
                stdout: stdout.as_bytes().to_vec(),
                stderr: Vec::new(),
            },
        )
    }

    #[test]
    fn test_reorders_out_of_order_chunks() {
        let list = commands(&["a", "b", "c", "d"]);
        let late_chunk = vec![ok(&list, 2, "2"), ok(&list, 3, "3")];
        let early_chunk = vec![ok(&list, 0, "0"), ok(&list, 1, "1")];

        let report = aggregate(&list, vec![late_chunk, early_chunk]);

        let stdout: Vec<String> = report.results().iter().map(|r| r.stdout_string()).collect();
        assert_eq!(stdout, vec!["0", "1", "2", "3"]);
        assert!(report.all_succeeded());
    }

    #[test]
    fn test_duplicate_commands_keep_positional_results() {
        let list = commands(&["date", "date", "date"]);
        let report = aggregate(
            &list,
            vec![vec![ok(&list, 2, "third")], vec![ok(&list, 0, "first"), ok(&list, 1, "second")]],
        );

        let stdout: Vec<String> = report.results().iter().map(|r| r.stdout_string()).collect();
        assert_eq!(stdout, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_missing_result_gets_placeholder() {
        let list = commands(&["a", "b", "c"]);
        let report = aggregate(&list, vec![vec![ok(&list, 0, ""), ok(&list, 2, "")]]);

        assert_eq!(report.len(), 3);
        let missing = &report.results()[1];
        assert_eq!(missing.command.as_str(), "b");
        assert_eq!(missing.exit_code, FAILED_EXIT_CODE);
        assert!(missing.stderr_string().contains("missing result"));
        assert!(!report.all_succeeded());
    }

    #[test]
    fn test_out_of_range_and_mismatched_results_are_ignored() {
        let list = commands(&["a", "b"]);
        let stray = (
            7,
            CommandResult::failed(Command::parse("zzz").unwrap(), "stray"),
        );
        let mismatched = (1, CommandResult::failed(Command::parse("a").unwrap(), "wrong"));

        let report = aggregate(&list, vec![vec![ok(&list, 0, ""), stray, mismatched]]);

        assert_eq!(report.len(), 2);
        assert!(report.results()[0].is_success());
        assert!(report.results()[1]
            .stderr_string()
            .contains("missing result"));
    }

    #[test]
    fn test_first_result_wins_on_duplicate_position() {
        let list = commands(&["a"]);
        let report = aggregate(
            &list,
            vec![vec![ok(&list, 0, "first")], vec![ok(&list, 0, "second")]],
        );
        assert_eq!(report.results()[0].stdout_string(), "first");
    }

    #[test]
    fn test_empty_list() {
        let report = aggregate(&CommandList::default(), Vec::<ChunkResults>::new());
        assert!(report.is_empty());
        assert!(!report.all_succeeded());
    }
}
