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

//! Sequential execution over a single session.

mod common;

use common::{command_texts, commands, endpoint, Event, MockConnector, RecordingReporter, Reply};
use sshbatch::error::{CommandExecutionError, ConnectionError};
use sshbatch::executor::{SequentialRunner, FAILED_EXIT_CODE};
use sshbatch::ssh::{Session, TransportOptions};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn test_three_commands_one_failing() {
    let connector = MockConnector::new().reply("false", Reply::exit(1));
    let list = commands(&["uptime", "false", "whoami"]);

    let report = SequentialRunner::new()
        .execute(&endpoint(), &connector, &TransportOptions::default(), &list)
        .await;

    assert_eq!(report.len(), 3);
    assert_eq!(command_texts(report.results()), vec!["uptime", "false", "whoami"]);
    let codes: Vec<i32> = report.results().iter().map(|r| r.exit_code).collect();
    assert_eq!(codes, vec![0, 1, 0]);
    assert_eq!(report.success_count(), 2);
    assert!(!report.all_succeeded());

    assert_eq!(connector.open_attempts(), 1);
    assert_eq!(connector.executed(), vec!["uptime", "false", "whoami"]);
    assert_eq!(connector.disconnects(), vec![0]);
}

#[tokio::test(start_paused = true)]
async fn test_all_succeed() {
    let connector = MockConnector::new();
    let list = commands(&["hostname", "date"]);

    let report = SequentialRunner::new()
        .execute(&endpoint(), &connector, &TransportOptions::default(), &list)
        .await;

    assert!(report.all_succeeded());
    assert_eq!(report.results()[1].stdout_string(), "out:date\n");
}

#[tokio::test(start_paused = true)]
async fn test_commands_are_paced() {
    let connector = MockConnector::new();
    let list = commands(&["a", "b", "c"]);

    SequentialRunner::new()
        .with_pacing(Duration::from_secs(2))
        .execute(&endpoint(), &connector, &TransportOptions::default(), &list)
        .await;

    let calls = connector.exec_calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1].at - calls[0].at, Duration::from_secs(2));
    assert_eq!(calls[2].at - calls[1].at, Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_execution_error_is_recorded_and_run_continues() {
    let connector = MockConnector::new().reply(
        "broken",
        Reply::Error(CommandExecutionError::Transport("channel closed".to_string())),
    );
    let list = commands(&["first", "broken", "last"]);

    let report = SequentialRunner::new()
        .execute(&endpoint(), &connector, &TransportOptions::default(), &list)
        .await;

    let broken = &report.results()[1];
    assert_eq!(broken.exit_code, FAILED_EXIT_CODE);
    assert!(broken.stderr_string().contains("channel closed"));
    assert_eq!(report.results()[2].exit_code, 0);
    assert_eq!(connector.executed(), vec!["first", "broken", "last"]);
}

#[tokio::test]
async fn test_connection_failure_fails_every_command() {
    let connector = MockConnector::new().fail_every_open(ConnectionError::AuthenticationFailed(
        "permission denied".to_string(),
    ));
    let list = commands(&["one", "two"]);

    let report = SequentialRunner::new()
        .execute(&endpoint(), &connector, &TransportOptions::default(), &list)
        .await;

    assert_eq!(report.len(), 2);
    for result in report.results() {
        assert_eq!(result.exit_code, FAILED_EXIT_CODE);
        let stderr = result.stderr_string();
        assert!(stderr.contains("connection to 192.0.2.10:22 failed"), "{stderr}");
        assert!(stderr.contains("permission denied"));
    }
    assert!(connector.executed().is_empty());
    assert!(connector.disconnects().is_empty());
}

#[tokio::test]
async fn test_empty_list_opens_nothing() {
    let connector = MockConnector::new();

    let report = SequentialRunner::new()
        .execute(
            &endpoint(),
            &connector,
            &TransportOptions::default(),
            &commands(&[]),
        )
        .await;

    assert!(report.is_empty());
    assert!(!report.all_succeeded());
    assert_eq!(connector.open_attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_interrupts_remaining_commands() {
    let connector = MockConnector::new().reply(
        "long",
        Reply::exit(0).delayed(Duration::from_secs(30)),
    );
    let list = commands(&["quick", "long", "never"]);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        trigger.cancel();
    });

    let report = SequentialRunner::new()
        .with_cancellation(cancel)
        .execute(&endpoint(), &connector, &TransportOptions::default(), &list)
        .await;

    let codes: Vec<i32> = report.results().iter().map(|r| r.exit_code).collect();
    assert_eq!(codes, vec![0, FAILED_EXIT_CODE, FAILED_EXIT_CODE]);
    assert!(report.results()[2].stderr_string().contains("interrupted"));
    assert_eq!(connector.executed(), vec!["quick", "long"]);
    assert_eq!(connector.disconnects(), vec![0]);
}

#[tokio::test(start_paused = true)]
async fn test_reporter_sees_lifecycle_in_order() {
    let connector = MockConnector::new().reply("false", Reply::exit(1));
    let reporter = Arc::new(RecordingReporter::default());
    let list = commands(&["true", "false"]);

    SequentialRunner::new()
        .with_reporter(reporter.clone())
        .execute(&endpoint(), &connector, &TransportOptions::default(), &list)
        .await;

    assert_eq!(
        reporter.events(),
        vec![
            Event::Opened(0),
            Event::Started(0, 0),
            Event::Finished(0, 0, 0),
            Event::Started(0, 1),
            Event::Finished(0, 1, 1),
            Event::Closed(0),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_run_leaves_caller_session_open() {
    let connector = MockConnector::new();
    let mut session = Session::connect(endpoint(), &connector, &TransportOptions::default())
        .await
        .unwrap();

    let report = SequentialRunner::new()
        .run(&mut session, &commands(&["ls", "pwd"]))
        .await;

    assert!(report.all_succeeded());
    assert!(session.is_connected());
    assert!(connector.disconnects().is_empty());
    session.close().await;
}
