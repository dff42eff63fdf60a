// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Thermal (receipt) printer strategy: text only, via the platform print
// command.

use async_trait::async_trait;
use tracing::{info, instrument};

use spoolwerk_core::config::PlatformCommands;
use spoolwerk_core::error::{DispatchError, DispatchResult};
use spoolwerk_core::types::{JobContent, PrintJob, PrinterConfig};

use super::DispatchStrategy;
use super::artifact::TransientArtifact;
use super::command::{print_args, run_command};

/// Writes the text to a temp file and submits it with the print program.
#[derive(Debug, Clone)]
pub struct ThermalStrategy {
    print_program: String,
}

impl ThermalStrategy {
    pub fn new(commands: &PlatformCommands) -> Self {
        Self {
            print_program: commands.print_program.clone(),
        }
    }

    async fn print_text(&self, printer: &PrinterConfig, copies: u32, text: &str) -> DispatchResult {
        let artifact = TransientArtifact::write(text.as_bytes(), ".txt")?;
        let args = print_args(printer, copies, artifact.path(), false);

        let outcome = run_command(&self.print_program, &args).await;
        artifact.discard();
        outcome
    }
}

#[async_trait]
impl DispatchStrategy for ThermalStrategy {
    #[instrument(skip_all, fields(job_id = %job.id, printer = %printer.name))]
    async fn dispatch(&self, printer: &PrinterConfig, job: &PrintJob) -> DispatchResult {
        let JobContent::Text(ref text) = job.content else {
            return Err(DispatchError::ContentMismatch {
                kind: printer.kind,
                content: job.content.label(),
            });
        };

        self.print_text(printer, job.copies, text).await?;
        info!(copies = job.copies, "receipt sent to thermal printer");
        Ok(())
    }
}
