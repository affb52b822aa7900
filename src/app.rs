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

//! Settings resolution and top-level execution for the `sshbatch` binary.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use zeroize::Zeroizing;

use crate::cli::Cli;
use crate::command_list::CommandList;
use crate::config::{expand_tilde, Config, DEFAULT_COMMANDS_FILE};
use crate::endpoint::Endpoint;
use crate::error::ConfigError;
use crate::executor::{
    partition, ExecutionReport, ParallelRunner, SequentialRunner, DEFAULT_PACING,
};
use crate::ssh::transport::DEFAULT_CONNECT_TIMEOUT;
use crate::ssh::{RusshConnector, StrictHostKeyChecking, TransportOptions};
use crate::ui::{ConsoleReporter, OutputFormatter};

pub const PASSWORD_ENV: &str = "SSHBATCH_PASSWORD";
pub const DEFAULT_WORKERS: usize = 4;

/// Everything needed for one run, after command-line flags have been merged
/// over the configuration file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoint: Endpoint,
    pub commands_file: PathBuf,
    pub parallel: bool,
    pub workers: usize,
    pub transport: TransportOptions,
    pub pacing: Duration,
    pub command_timeout: Option<Duration>,
}

impl Settings {
    pub fn resolve(cli: &Cli, config: &Config) -> Result<Self, ConfigError> {
        let username = cli.user.as_deref().or(config.username());

        let mut endpoint = match (cli.destination.as_deref(), config.hostname()) {
            (Some(destination), _) => parse_destination(destination, username)?,
            (None, Some(hostname)) => {
                let mut endpoint = parse_destination(hostname, username)?;
                if let Some(port) = config.port {
                    endpoint.port = port;
                }
                endpoint
            }
            (None, None) => {
                return Err(ConfigError::Invalid(
                    "no destination given; pass [user@]host or set 'hostname' in the configuration file"
                        .to_string(),
                ));
            }
        };
        if let Some(port) = cli.port {
            endpoint.port = port;
        }

        endpoint.credentials.key_path = cli
            .identity
            .as_deref()
            .map(expand_tilde)
            .or_else(|| config.key_filename());
        endpoint.credentials.password = config
            .password()
            .map(|p| Zeroizing::new(p.to_string()));

        let strict_mode = match cli
            .strict_host_key_checking
            .as_deref()
            .or(config.strict_host_key_checking.as_deref())
        {
            Some(mode) => mode.parse::<StrictHostKeyChecking>().map_err(ConfigError::Invalid)?,
            None => StrictHostKeyChecking::default(),
        };

        let connect_timeout = match cli.connect_timeout.or(config.connect_timeout) {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(DEFAULT_CONNECT_TIMEOUT),
        };

        let transport = TransportOptions::default()
            .with_legacy_algorithms(
                cli.legacy_algorithms || config.legacy_algorithms.unwrap_or(false),
            )
            .with_strict_mode(strict_mode)
            .with_connect_timeout(connect_timeout);

        let workers = cli.workers.or(config.workers).unwrap_or(DEFAULT_WORKERS);
        if workers == 0 {
            tracing::warn!("Worker count 0 is not usable, running with 1 worker");
        }

        Ok(Self {
            endpoint,
            commands_file: cli
                .commands_file
                .clone()
                .or_else(|| config.commands_file())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_COMMANDS_FILE)),
            parallel: cli.parallel || config.parallel.unwrap_or(false),
            workers: workers.max(1),
            transport,
            pacing: cli
                .delay_ms
                .or(config.delay_ms)
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_PACING),
            command_timeout: cli
                .timeout
                .or(config.timeout)
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        })
    }
}

fn parse_destination(destination: &str, username: Option<&str>) -> Result<Endpoint, ConfigError> {
    Endpoint::parse(destination, username).map_err(|e| ConfigError::Invalid(format!("{e:#}")))
}

/// Load the configuration named on the command line.
///
/// A missing explicit file is replaced by a template and reported as an
/// error so the user can fill it in. Without `--config` an empty
/// configuration is used.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    match Config::load(path) {
        Err(ConfigError::NotFound { path }) => {
            let written = Config::write_template(&path)
                .with_context(|| format!("Failed to create configuration template {path:?}"))?;
            anyhow::bail!(
                "Configuration file not found. A template was created at {}; fill in the connection details and run again",
                written.display()
            )
        }
        other => other.context("Failed to load configuration"),
    }
}

/// Fill in a password from the environment or an interactive prompt.
///
/// `--password` always prompts. Otherwise `SSHBATCH_PASSWORD` replaces any
/// configured password, and a prompt is shown only when no credentials are
/// left and stdin is a terminal.
pub fn resolve_password(settings: &mut Settings, force_prompt: bool) -> Result<()> {
    if !force_prompt {
        if let Ok(password) = std::env::var(PASSWORD_ENV)
            && !password.is_empty()
        {
            tracing::debug!("Using password from {}", PASSWORD_ENV);
            settings.endpoint.credentials.password = Some(Zeroizing::new(password));
            return Ok(());
        }

        if settings.endpoint.credentials.resolve().is_some() || !atty::is(atty::Stream::Stdin) {
            return Ok(());
        }
    }

    let password = Zeroizing::new(
        rpassword::prompt_password(format!("Enter password for {}: ", settings.endpoint))
            .with_context(|| "Failed to read password")?,
    );
    settings.endpoint.credentials.password = Some(password);
    Ok(())
}

/// Run the whole program. Returns whether every command succeeded.
pub async fn run(cli: Cli, cancel: CancellationToken) -> Result<bool> {
    let config = load_config(cli.config.as_deref())?;
    tracing::debug!("Configuration: {:?}", config);

    let mut settings = Settings::resolve(&cli, &config)?;
    resolve_password(&mut settings, cli.password)?;

    let commands = CommandList::load(&settings.commands_file)
        .with_context(|| "Failed to load command list")?;
    if commands.is_empty() {
        println!(
            "No commands found in {}",
            settings.commands_file.display()
        );
        return Ok(false);
    }

    println!(
        "{}",
        OutputFormatter::format_header(
            &settings.endpoint.to_string(),
            commands.len(),
            session_count(&settings, &commands)
        )
    );

    let report = execute(&settings, &commands, cancel).await;
    if settings.parallel {
        // Only status lines were printed while workers ran.
        print!("{}", OutputFormatter::format_report(&report));
    } else {
        print!("{}", OutputFormatter::format_summary(&report));
    }

    Ok(report.all_succeeded())
}

/// Number of sessions the run will open.
fn session_count(settings: &Settings, commands: &CommandList) -> usize {
    if settings.parallel {
        partition(commands, settings.workers).len()
    } else {
        1
    }
}

async fn execute(
    settings: &Settings,
    commands: &CommandList,
    cancel: CancellationToken,
) -> ExecutionReport {
    let connector = Arc::new(RusshConnector::new());

    if settings.parallel {
        ParallelRunner::new(connector)
            .with_reporter(Arc::new(ConsoleReporter::stdout(false)))
            .with_transport_options(settings.transport.clone())
            .with_command_timeout(settings.command_timeout)
            .with_cancellation(cancel)
            .run(&settings.endpoint, commands, settings.workers)
            .await
    } else {
        SequentialRunner::new()
            .with_pacing(settings.pacing)
            .with_command_timeout(settings.command_timeout)
            .with_reporter(Arc::new(ConsoleReporter::stdout(true)))
            .with_cancellation(cancel)
            .execute(
                &settings.endpoint,
                connector.as_ref(),
                &settings.transport,
                commands,
            )
            .await
    }
}
