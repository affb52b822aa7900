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

//! Splitting a command list into contiguous per-worker chunks.

use crate::command_list::{Command, CommandList};

/// A contiguous run of commands assigned to one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of this chunk among all chunks
    pub index: usize,
    /// Position of the chunk's first command in the full command list
    pub offset: usize,
    pub commands: Vec<Command>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Commands paired with their position in the full command list.
    pub fn positions(&self) -> impl Iterator<Item = (usize, &Command)> {
        self.commands
            .iter()
            .enumerate()
            .map(move |(i, command)| (self.offset + i, command))
    }
}

/// Number of workers actually used for `command_count` commands.
pub(crate) fn effective_workers(command_count: usize, worker_count: usize) -> usize {
    worker_count.clamp(1, command_count.max(1))
}

/// Split `commands` into at most `worker_count` contiguous chunks.
///
/// `worker_count` is clamped to `[1, len]` and every chunk except possibly
/// the last holds `ceil(len / workers)` commands. Chunks appear in list
/// order and their concatenation is exactly `commands`. An empty list
/// yields no chunks.
pub fn partition(commands: &CommandList, worker_count: usize) -> Vec<Chunk> {
    if commands.is_empty() {
        return Vec::new();
    }

    let workers = effective_workers(commands.len(), worker_count);
    let chunk_size = commands.len().div_ceil(workers);

    commands
        .as_slice()
        .chunks(chunk_size)
        .enumerate()
        .map(|(index, slice)| Chunk {
            index,
            offset: index * chunk_size,
            commands: slice.to_vec(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(n: usize) -> CommandList {
        (0..n)
            .map(|i| Command::parse(&format!("echo {i}")).unwrap())
            .collect()
    }

    fn sizes(chunks: &[Chunk]) -> Vec<usize> {
        chunks.iter().map(Chunk::len).collect()
    }

    #[test]
    fn test_ten_commands_three_workers() {
        let chunks = partition(&list(10), 3);
        assert_eq!(sizes(&chunks), vec![4, 4, 2]);
        assert_eq!(
            chunks.iter().map(|c| c.offset).collect::<Vec<_>>(),
            vec![0, 4, 8]
        );
    }

    #[test]
    fn test_more_workers_than_commands() {
        let chunks = partition(&list(3), 10);
        assert_eq!(sizes(&chunks), vec![1, 1, 1]);
    }

    #[test]
    fn test_zero_workers_clamped_to_one() {
        let chunks = partition(&list(5), 0);
        assert_eq!(sizes(&chunks), vec![5]);
    }

    #[test]
    fn test_empty_list_has_no_chunks() {
        assert!(partition(&CommandList::default(), 4).is_empty());
    }

    #[test]
    fn test_ceiling_split_can_use_fewer_workers() {
        // ceil(5 / 4) = 2, so only three chunks are needed.
        let chunks = partition(&list(5), 4);
        assert_eq!(sizes(&chunks), vec![2, 2, 1]);
    }

    #[test]
    fn test_partition_properties_hold_for_all_small_inputs() {
        for n in 1..=40 {
            let commands = list(n);
            for workers in 1..=12 {
                let chunks = partition(&commands, workers);
                let size = n.div_ceil(workers.min(n));

                assert!(chunks.len() <= workers.min(n), "n={n} w={workers}");
                assert!(chunks.iter().all(|c| !c.is_empty()), "n={n} w={workers}");
                assert!(chunks.iter().all(|c| c.len() <= size));

                let rejoined: Vec<Command> =
                    chunks.iter().flat_map(|c| c.commands.clone()).collect();
                assert_eq!(rejoined.as_slice(), commands.as_slice(), "n={n} w={workers}");

                for (i, chunk) in chunks.iter().enumerate() {
                    assert_eq!(chunk.index, i);
                    for (pos, command) in chunk.positions() {
                        assert_eq!(&commands[pos], command);
                    }
                }
            }
        }
    }

    #[test]
    fn test_chunk_count_equals_workers_when_evenly_divisible() {
        assert_eq!(partition(&list(12), 4).len(), 4);
        assert_eq!(partition(&list(7), 7).len(), 7);
        assert_eq!(partition(&list(1), 3).len(), 1);
    }

    #[test]
    fn test_effective_workers() {
        assert_eq!(effective_workers(10, 3), 3);
        assert_eq!(effective_workers(2, 8), 2);
        assert_eq!(effective_workers(4, 0), 1);
        assert_eq!(effective_workers(0, 4), 1);
    }
}
