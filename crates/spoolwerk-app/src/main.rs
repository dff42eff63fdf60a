// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolwerk: print spooler host daemon
//
// Entry point. Initialises logging, loads the config, starts the scheduler
// loop, and runs until Ctrl-C.

mod data_dir;

use std::path::Path;
use std::process::ExitCode;

use spoolwerk_core::config::SpoolerConfig;
use spoolwerk_core::error::Result;
use spoolwerk_print::Spooler;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Spoolwerk starting");

    let path = data_dir::config_path(std::env::args().nth(1), data_dir::process_env);
    match run(&path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(config = %path.display(), error = %e, "spooler failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    let spooler = Spooler::new(config)?;

    for printer in spooler.list_printers(false) {
        tracing::info!(
            printer = %printer.name,
            kind = %printer.kind,
            enabled = printer.enabled,
            "printer configured"
        );
    }

    spooler.start();
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C; shutting down");
    }

    tracing::info!(jobs = spooler.list_queue().len(), "shutting down");
    spooler.stop().await
}

fn load_config(path: &Path) -> Result<SpoolerConfig> {
    let config = SpoolerConfig::load(path)?;
    tracing::debug!(
        config = %serde_json::to_string(&config)?,
        "effective configuration"
    );
    Ok(config)
}
