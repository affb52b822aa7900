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

use anyhow::Result;
use clap::Parser;
use owo_colors::OwoColorize;
use tokio_util::sync::CancellationToken;

use sshbatch::{app, cli::Cli, ui::should_use_colors, utils::init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);
    owo_colors::set_override(should_use_colors());

    let cancel = CancellationToken::new();
    let shutdown = setup_signal_handlers()?;
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            shutdown.await;
            cancel.cancel();
        });
    }

    let all_succeeded = match app::run(cli, cancel.clone()).await {
        Ok(all_succeeded) => all_succeeded,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            false
        }
    };

    if cancel.is_cancelled() {
        eprintln!("\n{}", "Operation interrupted by user".yellow());
    }

    std::process::exit(if all_succeeded { 0 } else { 1 });
}

/// Resolves on the first Ctrl+C or SIGTERM.
fn setup_signal_handlers() -> Result<impl std::future::Future<Output = ()>> {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    Ok(async move {
        #[cfg(unix)]
        let terminate = sigterm.recv();
        #[cfg(not(unix))]
        let terminate = std::future::pending::<Option<()>>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received SIGINT (Ctrl+C)");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM");
            }
        }
    })
}
