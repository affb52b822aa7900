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

//! Execution engine: sequential and parallel runners, chunking, and
//! order-preserving result aggregation.

mod aggregate;
mod parallel;
mod partition;
mod reporter;
mod result_types;
mod sequential;

pub use aggregate::{aggregate, ChunkResults};
pub use parallel::ParallelRunner;
pub use partition::{partition, Chunk};
pub use reporter::{Reporter, TracingReporter};
pub use result_types::{CommandResult, ExecutionReport, FAILED_EXIT_CODE};
pub use sequential::{SequentialRunner, DEFAULT_PACING};
